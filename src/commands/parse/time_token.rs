/// A race-time token as printed in the run history, e.g. `19,3` or `19,36`.
///
/// The extracted text often glues the finishing position onto the time: a
/// race time carries exactly one decimal, so every fractional digit after the
/// first belongs to the position column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum TimeToken {
    Time(f64),
    TimeWithPosition { time: f64, position: Option<u32> },
    Unparsed,
}

impl TimeToken {
    pub(super) fn parse(token: &str) -> Self {
        let Some((whole, fraction)) = token.split_once(',') else {
            return Self::Unparsed;
        };

        let mut fraction_chars = fraction.chars();
        let Some(decimal) = fraction_chars.next() else {
            return Self::Unparsed;
        };
        let glued = fraction_chars.as_str();

        let Ok(time) = format!("{whole}.{decimal}").parse::<f64>() else {
            return Self::Unparsed;
        };

        if glued.is_empty() {
            return Self::Time(time);
        }

        Self::TimeWithPosition {
            time,
            position: parse_glued_position(glued),
        }
    }
}

fn parse_glued_position(glued: &str) -> Option<u32> {
    if let Ok(position) = glued.parse::<u32>() {
        return Some(position);
    }

    // `5x4`-style remainders: separator characters between the decimal and the position
    let start = glued.find(|character: char| character.is_ascii_digit())?;
    let digits = &glued[start..];
    let end = digits
        .find(|character: char| !character.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<u32>().ok()
}

/// Converts a comma-decimal token such as `19,4` to its numeric value.
pub(super) fn comma_decimal(token: &str) -> Option<f64> {
    token.replace(',', ".").parse::<f64>().ok()
}
