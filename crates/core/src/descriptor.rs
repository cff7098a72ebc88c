//! Named schedule descriptors: `@hourly`, `@daily`, `@every 90s`, ...

use std::str::FromStr;
use std::time::Duration;

use crate::error::DescriptorError;

/// Shortest interval `@every` accepts.
pub const MIN_EVERY_INTERVAL: Duration = Duration::from_secs(1);

/// Shorthand tokens accepted in the `descriptor` field besides `@every`.
pub const NAMED_DESCRIPTORS: &[&str] = &[
    "@yearly",
    "@annually",
    "@monthly",
    "@weekly",
    "@daily",
    "@midnight",
    "@hourly",
];

/// A parsed named descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// `@yearly` / `@annually`: midnight, January 1st.
    Yearly,
    /// `@monthly`: midnight, first day of the month.
    Monthly,
    /// `@weekly`: midnight between Saturday and Sunday.
    Weekly,
    /// `@daily` / `@midnight`.
    Daily,
    /// `@hourly`: top of every hour.
    Hourly,
    /// `@every <duration>`: fixed interval, never below [`MIN_EVERY_INTERVAL`].
    Every(Duration),
}

/// What a descriptor turns into at the trigger layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorTrigger {
    /// Six-field cron expression (`sec min hour dom month dow`).
    Cron(&'static str),
    /// Fixed delay between firings.
    Interval(Duration),
}

impl Descriptor {
    pub fn trigger(&self) -> DescriptorTrigger {
        match self {
            Descriptor::Yearly => DescriptorTrigger::Cron("0 0 0 1 1 *"),
            Descriptor::Monthly => DescriptorTrigger::Cron("0 0 0 1 * *"),
            Descriptor::Weekly => DescriptorTrigger::Cron("0 0 0 * * Sun"),
            Descriptor::Daily => DescriptorTrigger::Cron("0 0 0 * * *"),
            Descriptor::Hourly => DescriptorTrigger::Cron("0 0 * * * *"),
            Descriptor::Every(interval) => DescriptorTrigger::Interval(*interval),
        }
    }
}

impl FromStr for Descriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "@yearly" | "@annually" => return Ok(Descriptor::Yearly),
            "@monthly" => return Ok(Descriptor::Monthly),
            "@weekly" => return Ok(Descriptor::Weekly),
            "@daily" | "@midnight" => return Ok(Descriptor::Daily),
            "@hourly" => return Ok(Descriptor::Hourly),
            _ => {}
        }

        let Some(rest) = s.strip_prefix("@every") else {
            return Err(DescriptorError::Unknown(s.to_string()));
        };
        if rest.is_empty() {
            return Err(DescriptorError::MissingInterval);
        }
        // "@everyday" is an unknown token, not a malformed interval.
        if !rest.starts_with(char::is_whitespace) {
            return Err(DescriptorError::Unknown(s.to_string()));
        }

        let raw = rest.trim();
        if raw.is_empty() {
            return Err(DescriptorError::MissingInterval);
        }
        let interval =
            parse_duration(raw).ok_or_else(|| DescriptorError::InvalidInterval(raw.to_string()))?;
        if interval < MIN_EVERY_INTERVAL {
            return Err(DescriptorError::IntervalTooShort(raw.to_string()));
        }
        Ok(Descriptor::Every(interval))
    }
}

/// Nanoseconds per duration unit.
const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60_000_000_000),
    ("h", 3_600_000_000_000),
];

/// Parse a duration string made of `<number><unit>` components.
///
/// Numbers may carry a decimal fraction and components can be chained:
/// "90s", "1.5h", "1h30m", "250ms". Units are `ns`, `us`/`µs`, `ms`, `s`,
/// `m` and `h`. A bare `0` is accepted; any other number needs a unit.
/// Returns `None` if the string is empty or unparseable.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s == "0" {
        return Some(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = s;

    while !rest.is_empty() {
        let int_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (int_part, after) = rest.split_at(int_len);

        let (frac_part, after) = match after.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(tail.len());
                tail.split_at(frac_len)
            }
            None => ("", after),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, next) = after.split_at(unit_len);
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        let mut nanos = whole.checked_mul(scale)?;

        if !frac_part.is_empty() {
            // Digits past nanosecond precision carry no weight.
            let digits = frac_part.len().min(18);
            let frac: u128 = frac_part[..digits].parse().ok()?;
            nanos = nanos.checked_add(frac * scale / 10u128.pow(digits as u32))?;
        }

        total = total.checked_add(nanos)?;
        rest = next;
    }

    let secs = u64::try_from(total / 1_000_000_000).ok()?;
    let subsec = (total % 1_000_000_000) as u32;
    Some(Duration::new(secs, subsec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelisted_descriptors_parse() {
        assert_eq!("@yearly".parse(), Ok(Descriptor::Yearly));
        assert_eq!("@annually".parse(), Ok(Descriptor::Yearly));
        assert_eq!("@monthly".parse(), Ok(Descriptor::Monthly));
        assert_eq!("@weekly".parse(), Ok(Descriptor::Weekly));
        assert_eq!("@daily".parse(), Ok(Descriptor::Daily));
        assert_eq!("@midnight".parse(), Ok(Descriptor::Daily));
        assert_eq!("@hourly".parse(), Ok(Descriptor::Hourly));
    }

    #[test]
    fn every_parses_interval() {
        assert_eq!(
            "@every 90s".parse(),
            Ok(Descriptor::Every(Duration::from_secs(90)))
        );
        assert_eq!(
            "@every 1h30m".parse(),
            Ok(Descriptor::Every(Duration::from_secs(5_400)))
        );
        assert_eq!(
            "@every 1s".parse(),
            Ok(Descriptor::Every(Duration::from_secs(1)))
        );
    }

    #[test]
    fn every_below_one_second_rejected() {
        assert_eq!(
            "@every 500ms".parse::<Descriptor>(),
            Err(DescriptorError::IntervalTooShort("500ms".to_string()))
        );
        assert_eq!(
            "@every 0".parse::<Descriptor>(),
            Err(DescriptorError::IntervalTooShort("0".to_string()))
        );
    }

    #[test]
    fn every_without_interval_rejected() {
        assert_eq!(
            "@every".parse::<Descriptor>(),
            Err(DescriptorError::MissingInterval)
        );
        assert_eq!(
            "@every   ".parse::<Descriptor>(),
            Err(DescriptorError::MissingInterval)
        );
    }

    #[test]
    fn every_with_garbage_interval_rejected() {
        assert_eq!(
            "@every soon".parse::<Descriptor>(),
            Err(DescriptorError::InvalidInterval("soon".to_string()))
        );
        assert_eq!(
            "@every 5".parse::<Descriptor>(),
            Err(DescriptorError::InvalidInterval("5".to_string()))
        );
    }

    #[test]
    fn unknown_descriptor_rejected() {
        assert!(matches!(
            "@reboot".parse::<Descriptor>(),
            Err(DescriptorError::Unknown(_))
        ));
        assert!(matches!(
            "@everyday".parse::<Descriptor>(),
            Err(DescriptorError::Unknown(_))
        ));
        assert!(matches!(
            "daily".parse::<Descriptor>(),
            Err(DescriptorError::Unknown(_))
        ));
    }

    #[test]
    fn named_descriptors_map_to_cron() {
        assert_eq!(
            Descriptor::Daily.trigger(),
            DescriptorTrigger::Cron("0 0 0 * * *")
        );
        assert_eq!(
            Descriptor::Hourly.trigger(),
            DescriptorTrigger::Cron("0 0 * * * *")
        );
        assert_eq!(
            Descriptor::Every(Duration::from_secs(5)).trigger(),
            DescriptorTrigger::Interval(Duration::from_secs(5))
        );
    }

    #[test]
    fn whitelist_is_complete() {
        for token in NAMED_DESCRIPTORS {
            assert!(token.parse::<Descriptor>().is_ok(), "{token} should parse");
        }
    }

    // -- parse_duration ----------------------------------------------------

    #[test]
    fn parse_duration_single_units() {
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7_200)));
        assert_eq!(parse_duration("10us"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration("10µs"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration("7ns"), Some(Duration::from_nanos(7)));
    }

    #[test]
    fn parse_duration_fractions() {
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("0.5s"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration(".25m"), Some(Duration::from_secs(15)));
    }

    #[test]
    fn parse_duration_combined() {
        assert_eq!(
            parse_duration("1h2m3s"),
            Some(Duration::from_secs(3_600 + 120 + 3))
        );
        assert_eq!(
            parse_duration("1s500ms"),
            Some(Duration::from_millis(1_500))
        );
    }

    #[test]
    fn parse_duration_invalid() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("10d"), None);
        assert_eq!(parse_duration("-5s"), None);
        assert_eq!(parse_duration("1h30"), None);
    }
}
