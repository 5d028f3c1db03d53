// Path: crates/services/src/parser.rs
//! Extraction of proposal parameters from a printed contract call.
//!
//! The indexer reports each submission as free text such as
//! `propose(SP3...mega-dao.prop-42, u100)`. Two tokens are recognised:
//!
//! - the identifier: the run of non-`,` characters following the first `(`
//!   that is not immediately followed by a `,`;
//! - the start height: the leftmost `u<digits>)` literal.

use bridge_types::error::ParseFailure;

/// The proposal parameters carried by one submission transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCall {
    /// Fully-qualified proposal contract, the store key.
    pub identifier: String,
    /// First block of the voting window.
    pub start_height: u64,
}

/// Parses a transaction description into a [`ProposalCall`].
pub fn parse_description(description: &str) -> Result<ProposalCall, ParseFailure> {
    let identifier = extract_identifier(description).ok_or(ParseFailure::MissingIdentifier)?;
    let start_height = extract_start_height(description)?;
    Ok(ProposalCall {
        identifier: identifier.to_string(),
        start_height,
    })
}

fn extract_identifier(text: &str) -> Option<&str> {
    text.match_indices('(').find_map(|(open, _)| {
        let rest = text.get(open + 1..)?;
        let end = rest.find(',').unwrap_or(rest.len());
        rest.get(..end).filter(|ident| !ident.is_empty())
    })
}

fn extract_start_height(text: &str) -> Result<u64, ParseFailure> {
    for (at, _) in text.match_indices('u') {
        let Some(rest) = text.get(at + 1..) else {
            continue;
        };
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 || rest.as_bytes().get(digits_len) != Some(&b')') {
            continue;
        }
        let digits = rest.get(..digits_len).unwrap_or_default();
        return digits
            .parse::<u64>()
            .map_err(|_| ParseFailure::HeightOutOfRange(digits.to_string()));
    }
    Err(ParseFailure::MissingStartHeight)
}
