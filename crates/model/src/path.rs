//! Property path grammar used by the update protocol.
//!
//! A path addresses one mutable slot in the object graph:
//!
//! ```text
//! ident ( '[' digits ']' )? ( '.' ident ( '[' digits ']' )? )*
//! ```
//!
//! `"ZoneList[1].Temperature"` is the segment `ZoneList` indexed at 1,
//! followed by the nested property `Temperature`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`PropertyPath`]: a property name with an optional
/// collection index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
	pub name: String,
	pub index: Option<usize>,
}

/// Parsed address of a property inside the object graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyPath {
	pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
	#[error("property path is empty")]
	Empty,
	#[error("unexpected character {ch:?} at offset {offset}")]
	UnexpectedChar { ch: char, offset: usize },
	#[error("invalid collection index at offset {offset}")]
	InvalidIndex { offset: usize },
	#[error("unterminated index bracket at offset {offset}")]
	UnterminatedIndex { offset: usize },
	#[error("dangling '.' at end of path")]
	TrailingDot,
}

impl PropertyPath {
	/// Parse a path string. Failures are recoverable; the server answers
	/// them with `success = false`, never a transport fault.
	pub fn parse(input: &str) -> Result<Self, PathParseError> {
		let input = input.trim();
		if input.is_empty() {
			return Err(PathParseError::Empty);
		}

		let mut segments = Vec::new();
		let mut chars = input.char_indices().peekable();

		loop {
			// Identifier part.
			let mut name = String::new();
			while let Some(&(offset, ch)) = chars.peek() {
				if ch.is_alphanumeric() || ch == '_' {
					if name.is_empty() && ch.is_ascii_digit() {
						return Err(PathParseError::UnexpectedChar { ch, offset });
					}
					name.push(ch);
					chars.next();
				} else {
					break;
				}
			}
			if name.is_empty() {
				return match chars.peek() {
					Some(&(offset, ch)) => Err(PathParseError::UnexpectedChar { ch, offset }),
					None => Err(PathParseError::TrailingDot),
				};
			}

			// Optional `[index]`.
			let mut index = None;
			if let Some(&(open, '[')) = chars.peek() {
				chars.next();
				let mut digits = String::new();
				loop {
					match chars.next() {
						Some((_, ch)) if ch.is_ascii_digit() => digits.push(ch),
						Some((_, ']')) => break,
						Some((offset, ch)) => {
							return Err(PathParseError::UnexpectedChar { ch, offset })
						}
						None => return Err(PathParseError::UnterminatedIndex { offset: open }),
					}
				}
				if digits.is_empty() {
					return Err(PathParseError::InvalidIndex { offset: open });
				}
				index = Some(
					digits
						.parse()
						.map_err(|_| PathParseError::InvalidIndex { offset: open })?,
				);
			}

			segments.push(PathSegment { name, index });

			match chars.next() {
				None => break,
				Some((_, '.')) => {
					if chars.peek().is_none() {
						return Err(PathParseError::TrailingDot);
					}
				}
				Some((offset, ch)) => return Err(PathParseError::UnexpectedChar { ch, offset }),
			}
		}

		Ok(Self { segments })
	}

	/// The top-level property this path enters through.
	pub fn root(&self) -> &PathSegment {
		// parse() never yields an empty segment list
		&self.segments[0]
	}
}

impl fmt::Display for PropertyPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, segment) in self.segments.iter().enumerate() {
			if i > 0 {
				write!(f, ".")?;
			}
			write!(f, "{}", segment.name)?;
			if let Some(index) = segment.index {
				write!(f, "[{index}]")?;
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn seg(name: &str, index: Option<usize>) -> PathSegment {
		PathSegment {
			name: name.to_string(),
			index,
		}
	}

	#[test]
	fn parses_indexed_nested_path() {
		let path = PropertyPath::parse("ZoneList[1].Temperature").unwrap();
		assert_eq!(
			path.segments,
			vec![seg("ZoneList", Some(1)), seg("Temperature", None)]
		);
	}

	#[test]
	fn parses_bare_property() {
		let path = PropertyPath::parse("Setpoint").unwrap();
		assert_eq!(path.segments, vec![seg("Setpoint", None)]);
	}

	#[test]
	fn parses_deeply_nested_indices() {
		let path = PropertyPath::parse("Floors[0].Rooms[12].Name").unwrap();
		assert_eq!(
			path.segments,
			vec![
				seg("Floors", Some(0)),
				seg("Rooms", Some(12)),
				seg("Name", None)
			]
		);
	}

	#[test]
	fn round_trips_through_display() {
		for input in ["ZoneList[1].Temperature", "A.B.C", "X[0]"] {
			let path = PropertyPath::parse(input).unwrap();
			assert_eq!(path.to_string(), input);
		}
	}

	#[test]
	fn rejects_malformed_paths() {
		assert_eq!(PropertyPath::parse(""), Err(PathParseError::Empty));
		assert_eq!(PropertyPath::parse("A."), Err(PathParseError::TrailingDot));
		assert!(matches!(
			PropertyPath::parse("A[]"),
			Err(PathParseError::InvalidIndex { .. })
		));
		assert!(matches!(
			PropertyPath::parse("A[1"),
			Err(PathParseError::UnterminatedIndex { .. })
		));
		assert!(matches!(
			PropertyPath::parse("A[x]"),
			Err(PathParseError::UnexpectedChar { ch: 'x', .. })
		));
		assert!(matches!(
			PropertyPath::parse("1abc"),
			Err(PathParseError::UnexpectedChar { ch: '1', .. })
		));
		assert!(matches!(
			PropertyPath::parse("A..B"),
			Err(PathParseError::UnexpectedChar { ch: '.', .. })
		));
	}
}
