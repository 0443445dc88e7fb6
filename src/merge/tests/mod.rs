mod tests_sequential;
