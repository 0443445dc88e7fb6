mod tests_cursor;
