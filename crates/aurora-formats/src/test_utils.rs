//! Round-trip helpers shared by format test modules

use crate::AuroraFormat;
use std::fmt::Debug;

/// Build a value, parse it back and compare
pub fn test_round_trip<T>(original: &T) -> Result<(), Box<dyn std::error::Error>>
where
    T: AuroraFormat + PartialEq + Debug,
{
    let data = original.build()?;
    let parsed = T::parse(&data)?;

    if original != &parsed {
        return Err(format!(
            "Round-trip verification failed:\nOriginal: {:?}\nParsed: {:?}",
            original, parsed
        )
        .into());
    }

    Ok(())
}

/// Parse bytes, rebuild, reparse, and compare both parses
///
/// Returns the first parse so callers can inspect it.
pub fn test_round_trip_with_data<T>(data: &[u8]) -> Result<T, Box<dyn std::error::Error>>
where
    T: AuroraFormat + PartialEq + Debug,
{
    let parsed = T::parse(data)?;
    let rebuilt = parsed.build()?;
    let reparsed = T::parse(&rebuilt)?;

    if parsed != reparsed {
        return Err(format!(
            "Round-trip with data failed:\nParsed: {:?}\nReparsed: {:?}",
            parsed, reparsed
        )
        .into());
    }

    Ok(parsed)
}
