//! Minimal NumPy `.npy` codec for one-dimensional complex64 arrays.
//!
//! Layout (format version 1.0):
//!
//! ```text
//! \x93NUMPY | major=1 | minor=0 | u16 LE header_len | header dict + padding + '\n' | data
//! ```
//!
//! The header dict is a Python literal such as
//! `{'descr': '<c8', 'fortran_order': False, 'shape': (1000,), }`, padded with
//! spaces so the data section starts on a 64-byte boundary. Versions 2.0 and
//! 3.0 (u32 header length) are accepted on read.

use std::io::{self, Read, Write};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;
/// Complex64, little-endian
pub const DESCR: &str = "<c8";

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Write a v1.0 header for `len` complex64 samples. Returns bytes written.
pub fn write_header<W: Write>(writer: &mut W, len: usize) -> io::Result<usize> {
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': ({},), }}",
        DESCR, len
    );
    // magic(6) + version(2) + header_len(2)
    let preamble = MAGIC.len() + 4;
    let unpadded = preamble + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;
    let header_len_u16 = u16::try_from(header_len).map_err(|_| invalid("npy header too long"))?;

    writer.write_all(MAGIC)?;
    writer.write_all(&[1, 0])?;
    writer.write_all(&header_len_u16.to_le_bytes())?;
    writer.write_all(dict.as_bytes())?;
    writer.write_all(" ".repeat(padding).as_bytes())?;
    writer.write_all(b"\n")?;

    Ok(preamble + header_len)
}

/// Read and check a header, returning the number of complex64 samples.
pub fn read_header<R: Read>(reader: &mut R) -> io::Result<usize> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(invalid("missing NUMPY magic"));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            u16::from_le_bytes(buf) as usize
        }
        2 | 3 => {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            u32::from_le_bytes(buf) as usize
        }
        v => return Err(invalid(format!("unsupported npy version {}", v))),
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header)?;
    let header = String::from_utf8(header).map_err(|_| invalid("npy header is not UTF-8"))?;

    let descr = dict_value(&header, "descr")
        .map(|v| v.trim_matches(|c| c == '\'' || c == '"'))
        .ok_or_else(|| invalid("npy header has no descr"))?;
    if descr != DESCR {
        return Err(invalid(format!("expected dtype {}, found {}", DESCR, descr)));
    }

    if dict_value(&header, "fortran_order") != Some("False") {
        return Err(invalid("fortran-ordered arrays are not supported"));
    }

    let shape = dict_value(&header, "shape").ok_or_else(|| invalid("npy header has no shape"))?;
    let dims = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<usize>().map_err(|_| invalid(format!("bad shape {}", shape))))
        .collect::<io::Result<Vec<_>>>()?;

    Ok(dims.iter().product())
}

/// Raw text of a value in the header dict. Handles the flat dicts NumPy emits
/// (string, bool and tuple values).
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let quoted = format!("'{}':", key);
    let start = header.find(&quoted)? + quoted.len();
    let rest = header[start..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')')? + 1
    } else {
        rest.find(|c| c == ',' || c == '}')?
    };
    Some(rest[..end].trim())
}
