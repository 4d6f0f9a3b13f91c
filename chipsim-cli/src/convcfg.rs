use std::str::FromStr;

/// Helper struct to parse ADC conversion configurations.
#[derive(Debug, PartialEq, Eq)]
pub enum ConverterCfg {
    /// `fixed:value=<n>`
    Fixed { value: u16 },
}

fn parse_u16(s: &str) -> Option<u16> {
    match s.strip_prefix("0x") {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => s.parse::<u16>().ok(),
    }
}

impl FromStr for ConverterCfg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<ConverterCfg, &'static str> {
        let mut s = s.splitn(2, ':');
        let kind = s.next().unwrap_or_default();
        Ok(match kind {
            "fixed" => {
                let s = s.next().ok_or("missing required options")?.split(',');

                let mut value = None;

                for arg in s {
                    let mut s = arg.split('=');
                    let kind = s.next().unwrap_or_default();
                    match kind {
                        "value" => {
                            value = Some(
                                parse_u16(s.next().ok_or("missing argument for `value`")?)
                                    .ok_or("could not parse `value`")?,
                            );
                        }
                        _ => return Err("unknown `fixed` option"),
                    }
                }

                ConverterCfg::Fixed {
                    value: value.ok_or("missing `value` parameter")?,
                }
            }
            _ => return Err("invalid converter kind"),
        })
    }
}

/// Parse a 7-bit i2c address (decimal or `0x` hex).
pub fn parse_addr(s: &str) -> Result<u8, &'static str> {
    let addr = match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    }
    .map_err(|_| "could not parse address")?;

    if addr > 0x7f {
        return Err("address must fit in 7 bits");
    }
    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed() {
        assert_eq!(
            "fixed:value=0x1234".parse::<ConverterCfg>(),
            Ok(ConverterCfg::Fixed { value: 0x1234 })
        );
        assert_eq!(
            "fixed:value=1234".parse::<ConverterCfg>(),
            Ok(ConverterCfg::Fixed { value: 1234 })
        );
        assert_eq!(
            "fixed:value=70000".parse::<ConverterCfg>(),
            Err("could not parse `value`")
        );
        assert_eq!(
            "fixed".parse::<ConverterCfg>(),
            Err("missing required options")
        );
        assert_eq!(
            "sine:freq=1".parse::<ConverterCfg>(),
            Err("invalid converter kind")
        );
    }

    #[test]
    fn addr() {
        assert_eq!(parse_addr("0x20"), Ok(0x20));
        assert_eq!(parse_addr("32"), Ok(32));
        assert!(parse_addr("0x80").is_err());
        assert!(parse_addr("bogus").is_err());
    }
}
