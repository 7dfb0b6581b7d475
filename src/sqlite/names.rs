/// Turn a file path or header cell into a bare SQL identifier.
///
/// A trailing `.csv` is dropped, only the last `/` segment is kept and every
/// character that is not a letter or number becomes `_`. Distinct inputs may
/// map to the same name; nothing here disambiguates them.
pub fn sql_name_from_string(path: &str) -> String {
    let path = path.strip_suffix(".csv").unwrap_or(path);
    let last = path.rsplit('/').next().unwrap_or(path);

    last.chars()
        .map(|c| if c.is_alphabetic() || c.is_numeric() { c } else { '_' })
        .collect()
}

/// Double-quote an identifier so digits-first names and keywords still parse.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
