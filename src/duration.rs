//! Compact relative-time expressions such as `30m` or `2d`.

// self
use crate::_prelude::*;

/// Parse a duration expression into whole seconds.
///
/// The expression is an integer followed by exactly one unit: `s`, `m`, `h` or `d`. Combined
/// units (`1h30m`) and fractional amounts are rejected. The sign of the amount is not checked.
pub fn parse_duration(input: &str) -> Result<i64> {
	let invalid = || Error::InvalidDurationFormat { input: input.to_owned() };
	let Some(unit) = input.chars().last() else {
		return Err(invalid());
	};
	let multiplier = match unit {
		's' => 1,
		'm' => 60,
		'h' => 3_600,
		'd' => 86_400,
		_ => return Err(invalid()),
	};
	let amount: i64 = input[..input.len() - unit.len_utf8()].parse().map_err(|_| invalid())?;

	amount.checked_mul(multiplier).ok_or_else(invalid)
}
