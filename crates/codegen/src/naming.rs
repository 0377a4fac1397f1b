//! Identifier casing helpers shared by the emitters.

use proc_macro2::Ident;
use quote::format_ident;

/// `ZoneList` / `zone_list` / `zoneList` → `zone_list`.
pub fn snake_case(input: &str) -> String {
	let mut out = String::with_capacity(input.len() + 4);
	let mut prev_lower = false;
	for ch in input.chars() {
		if ch.is_uppercase() {
			if prev_lower {
				out.push('_');
			}
			for lower in ch.to_lowercase() {
				out.push(lower);
			}
			prev_lower = false;
		} else if ch == '-' || ch == ' ' {
			out.push('_');
			prev_lower = false;
		} else {
			out.push(ch);
			prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
		}
	}
	out
}

/// `zone_list` / `ZoneList` → `ZoneList`.
pub fn pascal_case(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut upper_next = true;
	for ch in input.chars() {
		if ch == '_' || ch == '-' || ch == ' ' {
			upper_next = true;
		} else if upper_next {
			out.extend(ch.to_uppercase());
			upper_next = false;
		} else {
			out.push(ch);
		}
	}
	out
}

pub fn snake_ident(input: &str) -> Ident {
	format_ident!("{}", snake_case(input))
}

pub fn pascal_ident(input: &str) -> Ident {
	format_ident!("{}", pascal_case(input))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn snake_case_handles_acronym_runs_and_digits() {
		assert_eq!(snake_case("ZoneList"), "zone_list");
		assert_eq!(snake_case("HVACZone"), "hvaczone");
		assert_eq!(snake_case("Temperature2"), "temperature2");
		assert_eq!(snake_case("already_snake"), "already_snake");
	}

	#[test]
	fn pascal_case_round_trips_simple_names() {
		assert_eq!(pascal_case("zone_list"), "ZoneList");
		assert_eq!(pascal_case("Zone"), "Zone");
	}
}
