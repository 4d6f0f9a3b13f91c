//! Line-oriented I2C transaction scripts.
//!
//! ```text
//! # configure, then sample twice
//! start 0x48 w
//! write 0x80
//! start 0x48 r
//! read 2
//! stop
//! ```

use std::str::FromStr;

use thiserror::Error;

use crate::bus::I2COp;

/// Largest byte count a single `read` may ask for.
pub const MAX_READ_COUNT: usize = 0xffff;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{cmd}`")]
    UnknownCommand { line: usize, cmd: String },
    #[error("line {line}: {msg}")]
    Malformed { line: usize, msg: &'static str },
    #[error("line {line}: could not parse `{val}` as a byte")]
    InvalidByte { line: usize, val: String },
    #[error("line {line}: `{val}` is not a 7-bit address")]
    InvalidAddress { line: usize, val: String },
}

/// A single bus operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `start <addr> <r|w>`
    Start { addr: u8, op: I2COp },
    /// `read [count]`
    Read { count: usize },
    /// `write <byte> [byte...]`
    Write(Vec<u8>),
    /// `stop`
    Stop,
}

/// A parsed script. Each command keeps the (1-based) line it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    commands: Vec<(usize, Command)>,
}

impl Script {
    pub fn commands(&self) -> impl Iterator<Item = (usize, &Command)> {
        self.commands.iter().map(|(line, cmd)| (*line, cmd))
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Accepts decimal, `0x` hex, or `0b` binary.
fn parse_num(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = s.strip_prefix("0b") {
        u32::from_str_radix(bin, 2).ok()
    } else {
        s.parse::<u32>().ok()
    }
}

fn parse_byte(line: usize, s: &str) -> Result<u8, ScriptError> {
    match parse_num(s) {
        Some(n) if n <= 0xff => Ok(n as u8),
        _ => Err(ScriptError::InvalidByte {
            line,
            val: s.into(),
        }),
    }
}

fn parse_command(line: usize, s: &str) -> Result<Command, ScriptError> {
    let mut args = s.split_whitespace();
    let cmd = match args.next() {
        Some(cmd) => cmd,
        None => return Err(ScriptError::Malformed { line, msg: "empty command" }),
    };

    let cmd = match cmd {
        "start" => {
            let addr = args.next().ok_or(ScriptError::Malformed {
                line,
                msg: "missing address for `start`",
            })?;
            let addr = match parse_num(addr) {
                Some(n) if n < 0x80 => n as u8,
                _ => {
                    return Err(ScriptError::InvalidAddress {
                        line,
                        val: addr.into(),
                    })
                }
            };
            let op = match args.next() {
                Some("r") | Some("read") => I2COp::Read,
                Some("w") | Some("write") => I2COp::Write,
                Some(_) => {
                    return Err(ScriptError::Malformed {
                        line,
                        msg: "direction must be `r` or `w`",
                    })
                }
                None => {
                    return Err(ScriptError::Malformed {
                        line,
                        msg: "missing direction for `start`",
                    })
                }
            };
            Command::Start { addr, op }
        }
        "read" => {
            let count = match args.next() {
                Some(n) => match parse_num(n) {
                    Some(n) if n > 0 && n as usize <= MAX_READ_COUNT => n as usize,
                    _ => {
                        return Err(ScriptError::Malformed {
                            line,
                            msg: "`read` count must be between 1 and 65535",
                        })
                    }
                },
                None => 1,
            };
            Command::Read { count }
        }
        "write" => {
            let data = args
                .by_ref()
                .map(|b| parse_byte(line, b))
                .collect::<Result<Vec<_>, _>>()?;
            if data.is_empty() {
                return Err(ScriptError::Malformed {
                    line,
                    msg: "`write` needs at least one byte",
                });
            }
            Command::Write(data)
        }
        "stop" => Command::Stop,
        other => {
            return Err(ScriptError::UnknownCommand {
                line,
                cmd: other.into(),
            })
        }
    };

    if args.next().is_some() {
        return Err(ScriptError::Malformed {
            line,
            msg: "trailing arguments",
        });
    }

    Ok(cmd)
}

impl FromStr for Script {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Script, ScriptError> {
        let mut commands = Vec::new();
        for (i, text) in s.lines().enumerate() {
            let text = match text.find('#') {
                Some(idx) => &text[..idx],
                None => text,
            }
            .trim();
            if text.is_empty() {
                continue;
            }
            commands.push((i + 1, parse_command(i + 1, text)?));
        }
        Ok(Script { commands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_skips_comments() {
        let script: Script = "
            # configure
            start 0x48 w
            write 0x80 1 0b11   # trailing comment
            start 72 read
            read
            read 3
            stop
        "
        .parse()
        .unwrap();

        let cmds = script.commands().collect::<Vec<_>>();
        assert_eq!(
            cmds,
            vec![
                (3, &Command::Start { addr: 0x48, op: I2COp::Write }),
                (4, &Command::Write(vec![0x80, 1, 3])),
                (5, &Command::Start { addr: 0x48, op: I2COp::Read }),
                (6, &Command::Read { count: 1 }),
                (7, &Command::Read { count: 3 }),
                (8, &Command::Stop),
            ]
        );
    }

    #[test]
    fn empty_script() {
        assert!("\n# nothing here\n".parse::<Script>().unwrap().is_empty());
    }

    #[test]
    fn errors_report_line_numbers() {
        assert_eq!(
            "stop\nfrobnicate".parse::<Script>().unwrap_err(),
            ScriptError::UnknownCommand {
                line: 2,
                cmd: "frobnicate".into()
            }
        );
        assert_eq!(
            "start 0x80 r".parse::<Script>().unwrap_err(),
            ScriptError::InvalidAddress {
                line: 1,
                val: "0x80".into()
            }
        );
        assert_eq!(
            "\n\nwrite 256".parse::<Script>().unwrap_err(),
            ScriptError::InvalidByte {
                line: 3,
                val: "256".into()
            }
        );
        assert!(matches!(
            "start 0x48".parse::<Script>(),
            Err(ScriptError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            "stop now".parse::<Script>(),
            Err(ScriptError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            "read 0".parse::<Script>(),
            Err(ScriptError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            "read 4000000000".parse::<Script>(),
            Err(ScriptError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            "read 0x10000".parse::<Script>(),
            Err(ScriptError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn largest_read_count() {
        let script: Script = "read 65535".parse().unwrap();
        assert_eq!(
            script.commands().collect::<Vec<_>>(),
            vec![(1, &Command::Read { count: MAX_READ_COUNT })]
        );
    }

    #[test]
    fn error_messages() {
        let e = "write".parse::<Script>().unwrap_err();
        assert_eq!(e.to_string(), "line 1: `write` needs at least one byte");
    }
}
