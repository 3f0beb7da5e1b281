use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;
use tracing::{debug, warn};
use super::board::MIN_SIZE;

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*([+-]?\d+)\s*$").expect("size pattern is valid"))
}

fn coordinates_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([+-]?\d+)\s+([+-]?\d+)\s*$").expect("coordinates pattern is valid")
    })
}

/// A single whole number, or `None` when the line holds anything else.
pub fn parse_size(input: &str) -> Option<i64> {
    let cap = size_pattern().captures(input)?;
    cap[1].parse().ok()
}

/// Two whitespace separated whole numbers, column first.
pub fn parse_coordinates(input: &str) -> Option<(i64, i64)> {
    let cap = coordinates_pattern().captures(input)?;
    let x = cap[1].parse().ok()?;
    let y = cap[2].parse().ok()?;
    Some((x, y))
}

fn prompt<W: Write>(output: &mut W, text: &str) -> io::Result<()> {
    write!(output, "{}", text)?;
    output.flush()
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"))
    }
    Ok(line)
}

/// Prompts until a size of at least `MIN_SIZE` is entered.
pub fn read_board_size<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<usize> {
    loop {
        prompt(output, &format!("Enter board size (minimum {}): ", MIN_SIZE))?;
        let line = read_line(input)?;
        match parse_size(&line).map(usize::try_from) {
            Some(Ok(size)) if size >= MIN_SIZE => return Ok(size),
            Some(_) => debug!(input = line.trim(), "board size below minimum"),
            None => {
                warn!(input = line.trim(), "unparsable board size");
                writeln!(output, "Board size must be a whole number.")?;
            }
        }
    }
}

/// Prompts until a line with two whole numbers arrives. Range checks belong to the board.
pub fn read_coordinates<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<(i64, i64)> {
    loop {
        prompt(output, "Enter coordinates: ")?;
        let line = read_line(input)?;
        match parse_coordinates(&line) {
            Some(coordinates) => return Ok(coordinates),
            None => {
                warn!(input = line.trim(), "unparsable coordinates");
                writeln!(output, "Coordinates must be two whole numbers: x y")?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(parse_coordinates("3 4\n"), Some((3, 4)));
        assert_eq!(parse_coordinates("  10\t2  "), Some((10, 2)));
        assert_eq!(parse_coordinates("0 -1"), Some((0, -1)));
        assert_eq!(parse_coordinates("3"), None);
        assert_eq!(parse_coordinates("3 4 5"), None);
        assert_eq!(parse_coordinates("a b"), None);
        assert_eq!(parse_coordinates("99999999999999999999 1"), None);
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("12\n"), Some(12));
        assert_eq!(parse_size("-3"), Some(-3));
        assert_eq!(parse_size("nine"), None);
        assert_eq!(parse_size("9 9"), None);
    }

    #[test]
    fn size_prompt_repeats_until_large_enough() {
        let mut input = Cursor::new("4\nbig\n-10\n11\n");
        let mut output = Vec::new();
        assert_eq!(read_board_size(&mut input, &mut output).unwrap(), 11);

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Enter board size (minimum 9): ").count(), 4);
        assert_eq!(text.matches("Board size must be a whole number.").count(), 1);
    }

    #[test]
    fn coordinates_prompt_skips_bad_lines() {
        let mut input = Cursor::new("\nx 1\n2 3\n");
        let mut output = Vec::new();
        assert_eq!(read_coordinates(&mut input, &mut output).unwrap(), (2, 3));

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Enter coordinates: ").count(), 3);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut output = Vec::new();
        let err = read_coordinates(&mut Cursor::new(""), &mut output).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = read_board_size(&mut Cursor::new("3\n"), &mut output).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
