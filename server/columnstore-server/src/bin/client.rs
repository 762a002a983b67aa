//! Thin interactive client: reads command lines from stdin, sends each
//! over the wire protocol, and prints the server's reply. The textual
//! command parser and CLI front-end are out of scope for design rigor
//! per spec.md §1 — this binary exists only so the wire protocol has
//! someone to talk to.

use std::io::{self, BufRead, Read, Write};
use std::os::unix::net::UnixStream;

use columnstore_server::proto::{read_payload, write_message, Header, StatusWire, PRINT_END_SENTINEL};

fn socket_path() -> String {
    std::env::var("COLUMNSTORE_SOCKET").unwrap_or_else(|_| "/tmp/columnstore.sock".to_string())
}

fn main() -> io::Result<()> {
    let mut stream = UnixStream::connect(socket_path())?;
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        write_message(&mut stream, StatusWire::OkDone, line.as_bytes())?;

        if line.trim().starts_with("print(") {
            read_print_response(&mut stream)?;
            continue;
        }

        let header = Header::read_from(&mut stream)?;
        let payload = read_payload(&mut stream, &header)?;
        match header.status {
            StatusWire::OkDone => {
                if !payload.is_empty() {
                    println!("{}", String::from_utf8_lossy(&payload));
                }
            }
            other => eprintln!("{other:?}: {}", String::from_utf8_lossy(&payload)),
        }

        if line.trim() == "shutdown()" {
            break;
        }
    }
    Ok(())
}

fn read_print_response(stream: &mut UnixStream) -> io::Result<()> {
    let meta_header = Header::read_from(stream)?;
    let meta = read_payload(stream, &meta_header)?;
    let num_columns = i32::from_le_bytes(meta[0..4].try_into().unwrap());
    let multi_row = i32::from_le_bytes(meta[4..8].try_into().unwrap());

    if multi_row == 0 {
        let type_header = Header::read_from(stream)?;
        let type_payload = read_payload(stream, &type_header)?;
        let type_codes: Vec<i32> = type_payload
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
            .collect();

        for code in type_codes {
            let header = Header::read_from(stream)?;
            let payload = read_payload(stream, &header)?;
            match code {
                0 => print!("{} ", i32::from_le_bytes(payload[0..4].try_into().unwrap())),
                1 => print!("{} ", i64::from_le_bytes(payload[0..8].try_into().unwrap())),
                2 => print!("{} ", f64::from_le_bytes(payload[0..8].try_into().unwrap())),
                _ => print!("? "),
            }
        }
        println!();
        let end = Header::read_from(stream)?;
        debug_assert_eq!(end.length, PRINT_END_SENTINEL);
    } else {
        let num_columns = num_columns.max(1) as usize;
        loop {
            let header = Header::read_from(stream)?;
            if header.length == PRINT_END_SENTINEL {
                break;
            }
            let payload = read_payload(stream, &header)?;
            let values: Vec<i32> = payload
                .chunks_exact(4)
                .map(|c| i32::from_le_bytes(c.try_into().unwrap()))
                .collect();
            // Tiles are column-major (every column's slice of rows is
            // contiguous), not row-major — un-tile before printing.
            let rows = values.len() / num_columns;
            for r in 0..rows {
                let row: Vec<String> = (0..num_columns).map(|c| values[c * rows + r].to_string()).collect();
                println!("{}", row.join(" "));
            }
        }
    }
    let _ = io::stdout().flush();
    Ok(())
}
