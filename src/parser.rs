use log::{debug, info, trace};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};
use crate::sat_structures::*;

/// Reads a DIMACS CNF file.
pub fn parse_dimacs(filename: impl AsRef<Path>) -> Result<Problem> {
    let path = filename.as_ref();
    let file = File::open(path)?;
    let problem = from_reader(file)?;
    info!(target: "parser", "successfully read {}", path.display());
    Ok(problem)
}

pub fn parse_str(input: &str) -> Result<Problem> {
    from_reader(input.as_bytes())
}

/// Parses DIMACS CNF text.
///
/// Exactly one `p cnf <n_vars> <n_clauses>` header is accepted and the number
/// of parsed clauses must match it. Literal bounds are not checked against
/// `n_vars`.
pub fn from_reader<R: Read>(reader: R) -> Result<Problem> {
    let reader = BufReader::new(reader);
    let mut header: Option<(u32, usize)> = None;
    let mut clauses: Vec<Clause> = Vec::new();
    let mut current: Clause = Vec::new();
    let mut last_line = 0;

    // CLAUSE LOOP
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        last_line = line_no;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('c') {
            continue;
        }
        // SATLIB files close the clause section with "%"
        if line.starts_with('%') {
            trace!(target: "parser", "end marker at line {}", line_no);
            break;
        }
        if line.starts_with('p') {
            if header.is_some() {
                return Err(Error::parse(line_no, "multiple header lines"));
            }
            let parsed = parse_header(line, line_no)?;
            clauses.reserve(parsed.1.min(1 << 16));
            header = Some(parsed);
            continue;
        }
        if header.is_none() {
            return Err(Error::parse(line_no, "clause before header"));
        }

        // LITERAL LOOP
        for token in line.split_whitespace() {
            let ilit: i32 = token
                .parse()
                .map_err(|_| Error::parse(line_no, format!("invalid literal token {:?}", token)))?;
            if ilit == 0 {
                trace!(target: "parser", "clause {}: {:?}", clauses.len(), current);
                clauses.push(std::mem::take(&mut current));
            } else {
                current.push(Literal::from_ilit(ilit)?);
            }
        }
    }

    if !current.is_empty() {
        clauses.push(current);
    }

    let Some((n_vars, n_clauses)) = header else {
        return Err(Error::parse(last_line, "no header"));
    };
    if n_clauses != clauses.len() {
        return Err(Error::parse(
            last_line,
            format!(
                "number of clauses do not match: header says {}, found {}",
                n_clauses,
                clauses.len()
            ),
        ));
    }
    debug!(target: "parser", "parsed {} vars, {} clauses", n_vars, n_clauses);
    Problem::new(n_vars, clauses)
}

fn parse_header(line: &str, line_no: usize) -> Result<(u32, usize)> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 || parts[0] != "p" || parts[1] != "cnf" {
        return Err(Error::parse(line_no, format!("malformed header {:?}", line)));
    }
    let n_vars: u32 = parts[2]
        .parse()
        .map_err(|_| Error::parse(line_no, format!("invalid variable count {:?}", parts[2])))?;
    if n_vars > MAX_VARS {
        return Err(Error::parse(
            line_no,
            format!("variable count {} exceeds {}", n_vars, MAX_VARS),
        ));
    }
    let n_clauses = parts[3]
        .parse()
        .map_err(|_| Error::parse(line_no, format!("invalid clause count {:?}", parts[3])))?;
    Ok((n_vars, n_clauses))
}

/// Prints `problem` as DIMACS CNF; [`parse_str`] reads it back unchanged.
pub fn to_dimacs(problem: &Problem) -> String {
    let mut out = String::with_capacity(16 + 4 * problem.n_cells());
    let _ = writeln!(out, "p cnf {} {}", problem.n_vars(), problem.n_clauses());
    for clause in problem.clauses() {
        for l in clause.iter() {
            let _ = write!(out, "{} ", l.ilit());
        }
        out.push_str("0\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(ilit: i32) -> Literal {
        Literal::from_ilit(ilit).unwrap()
    }

    const SAMPLE: &str = r"
c a comment
p cnf 6 7
1 2 3 4 0
-1 -2 -3 0
-2 4 0
1 3 0
-4 -2 -1 0
5 6 0
4 -2 0
";

    #[test]
    fn parse_sample() {
        let p = parse_str(SAMPLE).unwrap();
        assert_eq!(p.n_vars(), 6);
        assert_eq!(p.n_clauses(), 7);
        assert_eq!(
            p.clauses()[0],
            (0..4).map(|i| Literal::positive(Variable::new(i).unwrap())).collect::<Vec<_>>()
        );
        assert_eq!(p.clauses()[4], vec![lit(-4), lit(-2), lit(-1)]);
    }

    #[test]
    fn clauses_may_span_lines_and_share_lines() {
        let p = parse_str("p cnf 3 3\n1 -2\n3 0 -1 0\n2 0\n").unwrap();
        assert_eq!(
            p.clauses(),
            &[vec![lit(1), lit(-2), lit(3)], vec![lit(-1)], vec![lit(2)]]
        );
    }

    #[test]
    fn unterminated_last_clause_is_kept() {
        let p = parse_str("p cnf 2 2\n1 2 0\n-1 -2\n").unwrap();
        assert_eq!(p.clauses()[1], vec![lit(-1), lit(-2)]);
    }

    #[test]
    fn satlib_end_marker_stops_parsing() {
        let p = parse_str("p cnf 2 1\n1 -2 0\n%\n0\n\n").unwrap();
        assert_eq!(p.n_clauses(), 1);
    }

    #[test]
    fn lone_zero_is_an_empty_clause() {
        let p = parse_str("p cnf 1 2\n1 0\n0\n").unwrap();
        assert_eq!(p.clauses()[1], Vec::<Literal>::new());
    }

    #[test]
    fn repeated_header_fails() {
        let err = parse_str("p cnf 2 1\np cnf 2 1\n1 2 0\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn clause_count_mismatch_fails() {
        let err = parse_str("p cnf 3 2\n1 2 0\n-1 3 0\n2 -3 0\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn missing_header_fails() {
        assert!(matches!(parse_str("c only comments\n"), Err(Error::Parse { .. })));
        assert!(matches!(parse_str("1 2 0\n"), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn malformed_tokens_fail() {
        assert!(matches!(parse_str("p cnf 2 1\n1 x 0\n"), Err(Error::Parse { line: 2, .. })));
        assert!(matches!(parse_str("p dnf 2 1\n1 0\n"), Err(Error::Parse { .. })));
        assert!(matches!(parse_str("p cnf two 1\n1 0\n"), Err(Error::Parse { .. })));
    }

    #[test]
    fn oversized_variable_count_fails() {
        let err = parse_str("c big\np cnf 4294967295 0\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
        assert!(parse_str("p cnf 2147483648 0\n").is_err());
        assert_eq!(parse_str("p cnf 2147483647 0\n").unwrap().n_vars(), MAX_VARS);
    }

    #[test]
    fn literals_are_not_bounds_checked() {
        let p = parse_str("p cnf 1 1\n1 9 0\n").unwrap();
        assert_eq!(p.clauses()[0][1].var().idx(), 8);
    }

    #[test]
    fn printed_form_round_trips() {
        let p = parse_str(SAMPLE).unwrap();
        let text = to_dimacs(&p);
        assert!(text.starts_with("p cnf 6 7\n1 2 3 4 0\n"));
        assert_eq!(parse_str(&text).unwrap(), p);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            parse_dimacs("/nonexistent/problem.cnf"),
            Err(Error::Io(_))
        ));
    }
}
