//! The tiny assembly language that resolves symbolic bytes into VMem
//! words, `spec.md` §4.E `assembleVmem` / §6 "Assembly text".

use std::collections::HashMap;

use crate::error::AssemblyError;

/// A label reference that could not be resolved at the point it was
/// written; patched once every label in the source has been seen.
struct PendingPatch {
    address: usize,
    symbol: String,
    line: usize,
}

/// Assembles `source` into a word buffer of length `vmem_size`.
///
/// Line-oriented: `;` starts a line comment, `name:` defines a label at
/// the current write cursor, `.org <addr>` relocates the cursor, and any
/// other token is either an integer literal (decimal, `0x` hex, `0b`
/// binary) or a forward/backward reference to a label, resolved once the
/// whole source has been scanned (`spec.md` §6).
pub fn assemble_vmem(
    source: &str,
    vmem_size: usize,
) -> Result<(Vec<u64>, HashMap<String, usize>), AssemblyError> {
    let mut vmem = vec![0u64; vmem_size];
    let mut symbols = HashMap::new();
    let mut pending = Vec::new();
    let mut cursor = 0usize;

    for (line_number, raw_line) in source.lines().enumerate() {
        let line = line_number + 1;
        let code = match raw_line.split_once(';') {
            Some((before, _)) => before,
            None => raw_line,
        };

        let mut tokens = code.split_whitespace().peekable();
        while let Some(token) = tokens.next() {
            if let Some(label) = token.strip_suffix(':') {
                if label.is_empty() {
                    return Err(AssemblyError::Parse {
                        line,
                        message: "empty label".to_string(),
                    });
                }
                symbols.insert(label.to_string(), cursor);
                continue;
            }

            if token == ".org" {
                let operand = tokens.next().ok_or_else(|| AssemblyError::Parse {
                    line,
                    message: ".org requires an address".to_string(),
                })?;
                cursor = parse_literal(operand).ok_or_else(|| AssemblyError::Parse {
                    line,
                    message: format!("invalid .org address '{operand}'"),
                })?;
                continue;
            }

            write_word(&mut vmem, &mut pending, cursor, token, line)?;
            cursor += 1;
        }
    }

    for patch in pending {
        let Some(&address) = symbols.get(&patch.symbol) else {
            return Err(AssemblyError::UnresolvedSymbol {
                line: patch.line,
                symbol: patch.symbol,
            });
        };
        if let Some(slot) = vmem.get_mut(patch.address) {
            *slot = address as u64;
        }
    }

    Ok((vmem, symbols))
}

fn write_word(
    vmem: &mut [u64],
    pending: &mut Vec<PendingPatch>,
    cursor: usize,
    token: &str,
    line: usize,
) -> Result<(), AssemblyError> {
    let Some(slot) = vmem.get_mut(cursor) else {
        return Err(AssemblyError::Parse {
            line,
            message: format!("write at {cursor} exceeds vmem size {}", vmem.len()),
        });
    };

    if let Some(value) = parse_literal(token) {
        *slot = value as u64;
    } else {
        pending.push(PendingPatch {
            address: cursor,
            symbol: token.to_string(),
            line,
        });
    }
    Ok(())
}

/// Parses a decimal, `0x`-hex, or `0b`-binary integer literal. Returns
/// `None` for anything else (treated as a symbol reference by the caller).
fn parse_literal(token: &str) -> Option<usize> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = token.strip_prefix("0b").or_else(|| token.strip_prefix("0B")) {
        usize::from_str_radix(bin, 2).ok()
    } else {
        token.parse().ok()
    }
}

/// Writes `vmem` as whitespace-separated hex words, one per cell
/// (`spec.md` §6 `dumpVMemToText`).
pub fn dump_vmem_to_text(vmem: &[u64]) -> String {
    vmem.iter()
        .map(|word| format!("{word:x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
