//! One client session: reads command lines off the wire, dispatches them
//! against the shared engine, and replies following spec.md §6's
//! load/print sub-protocols.

use std::io::{Read, Write};
use std::sync::Mutex;

use columnstore_core::{dispatch, parser, Batch, ClientContext, Dispatched, Engine, EngineConfig};

use crate::proto::{read_payload, write_message, Header, StatusWire};

/// Runs one session to completion (until the client disconnects or sends
/// `shutdown`). Returns `Ok(true)` if the session ended via `shutdown`.
pub fn run_session<S: Read + Write>(
    stream: &mut S,
    engine: &Mutex<Engine>,
    config: &EngineConfig,
) -> std::io::Result<bool> {
    let context = ClientContext::new(config.default_client_handles);
    let mut batch = Batch::default();

    loop {
        let header = match Header::read_from(stream) {
            Ok(h) => h,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(e) => return Err(e),
        };
        let payload = read_payload(stream, &header)?;
        let line = String::from_utf8_lossy(&payload).into_owned();
        let trimmed = line.trim();

        if trimmed.starts_with("load") {
            handle_load(stream, engine)?;
            continue;
        }

        let parsed = match parser::parse_line(trimmed) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => {
                write_message(stream, StatusWire::OkDone, &[])?;
                continue;
            }
            Err(e) => {
                write_message(stream, StatusWire::from_status(e.status()), e.to_string().as_bytes())?;
                continue;
            }
        };

        let outcome = {
            let mut guard = engine.lock().unwrap();
            dispatch(parsed, &mut guard, &context, &mut batch)
        };

        match outcome {
            Ok(Dispatched::Done) => {
                write_message(stream, StatusWire::OkDone, &[])?;
            }
            Ok(Dispatched::Print(values)) => {
                handle_print(stream, &values, config.print_tile_rows)?;
            }
            Ok(Dispatched::Shutdown) => {
                write_message(stream, StatusWire::OkDone, &[])?;
                return Ok(true);
            }
            Err(e) => {
                write_message(stream, StatusWire::from_status(e.status()), e.to_string().as_bytes())?;
            }
        }
    }
}

/// Drives the load sub-protocol (spec.md §6): ack the `load` command, read
/// a decimal file-size header+payload, then repeatedly read chunks until a
/// zero-length payload signals end-of-file, before parsing the assembled
/// CSV text through the same per-row insert path `relational_insert` uses.
fn handle_load<S: Read + Write>(stream: &mut S, engine: &Mutex<Engine>) -> std::io::Result<()> {
    write_message(stream, StatusWire::OkWaitForResponse, &[])?;

    let size_header = Header::read_from(stream)?;
    let size_payload = read_payload(stream, &size_header)?;
    let _declared_size: u64 = String::from_utf8_lossy(&size_payload).trim().parse().unwrap_or(0);
    write_message(stream, StatusWire::OkWaitForResponse, &[])?;

    let mut contents = Vec::new();
    loop {
        let chunk_header = Header::read_from(stream)?;
        if chunk_header.length == 0 {
            write_message(stream, StatusWire::OkDone, &[])?;
            break;
        }
        let chunk = read_payload(stream, &chunk_header)?;
        contents.extend_from_slice(&chunk);
        write_message(stream, StatusWire::OkWaitForResponse, &[])?;
    }

    let text = String::from_utf8_lossy(&contents).into_owned();
    let result = {
        let mut guard = engine.lock().unwrap();
        columnstore_core::dispatcher::load_csv(&text, &mut guard)
    };
    match result {
        Ok(()) => write_message(stream, StatusWire::OkDone, &[]),
        Err(e) => write_message(stream, StatusWire::from_status(e.status()), e.to_string().as_bytes()),
    }
}

/// Drives the print sub-protocol (spec.md §6): a metadata header
/// `{num_columns, multi_row_flag}`, then either per-column single-value
/// headers or tiled multi-row frames, terminated by the end sentinel.
fn handle_print<S: Read + Write>(
    stream: &mut S,
    values: &[columnstore_core::ResultValue],
    tile_rows: usize,
) -> std::io::Result<()> {
    use columnstore_core::ops::print::{build_print, PrintFrames};

    let frames = match build_print(values, tile_rows) {
        Ok(f) => f,
        Err(e) => {
            return write_message(stream, StatusWire::from_status(e.status()), e.to_string().as_bytes());
        }
    };

    match frames {
        PrintFrames::SingleRow(results) => {
            let mut meta = Vec::with_capacity(8);
            meta.extend_from_slice(&(results.len() as i32).to_le_bytes());
            meta.extend_from_slice(&0i32.to_le_bytes());
            write_message(stream, StatusWire::OkDone, &meta)?;

            let type_codes: Vec<u8> = results
                .iter()
                .flat_map(|r| (r.type_code() as i32).to_le_bytes())
                .collect();
            write_message(stream, StatusWire::OkDone, &type_codes)?;

            for result in &results {
                let payload = match result {
                    columnstore_core::ResultValue::Int(v) => v[0].to_le_bytes().to_vec(),
                    columnstore_core::ResultValue::Long(v) => v[0].to_le_bytes().to_vec(),
                    columnstore_core::ResultValue::Double(v) => v[0].to_le_bytes().to_vec(),
                };
                write_message(stream, StatusWire::OkDone, &payload)?;
            }
        }
        PrintFrames::MultiRow { num_columns, tiles, .. } => {
            let mut meta = Vec::with_capacity(8);
            meta.extend_from_slice(&(num_columns as i32).to_le_bytes());
            meta.extend_from_slice(&1i32.to_le_bytes());
            write_message(stream, StatusWire::OkDone, &meta)?;

            for tile in &tiles {
                let payload: Vec<u8> = tile.iter().flat_map(|v| v.to_le_bytes()).collect();
                write_message(stream, StatusWire::OkDone, &payload)?;
            }
        }
    }

    Header::print_end().write_to(stream)?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use columnstore_core::EngineConfig;
    use std::io::Cursor;

    /// An in-memory duplex so a unit test can drive both ends of the
    /// protocol without an actual socket.
    struct Duplex {
        to_server: Cursor<Vec<u8>>,
        from_server: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.to_server.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.from_server.write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn encode(status: StatusWire, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_message(&mut buf, status, payload).unwrap();
        buf
    }

    #[test]
    fn create_db_and_table_then_shutdown() {
        let mut input = Vec::new();
        input.extend(encode(StatusWire::OkDone, b"create(db,\"db1\")"));
        input.extend(encode(StatusWire::OkDone, b"create(tbl,\"t1\",db1,2)"));
        input.extend(encode(StatusWire::OkDone, b"shutdown()"));

        let mut duplex = Duplex {
            to_server: Cursor::new(input),
            from_server: Vec::new(),
        };

        let engine = Mutex::new(Engine::new(EngineConfig::default()));
        let config = EngineConfig::default();
        let ended_in_shutdown = run_session(&mut duplex, &engine, &config).unwrap();
        assert!(ended_in_shutdown);

        let db = engine.lock().unwrap();
        assert!(db.current_db().unwrap().table("t1").is_ok());
    }

    #[test]
    fn unparseable_command_gets_error_status_not_a_panic() {
        let mut input = Vec::new();
        input.extend(encode(StatusWire::OkDone, b"select db1.t1.a, 2, 5)"));
        input.extend(encode(StatusWire::OkDone, b"shutdown()"));

        let mut duplex = Duplex {
            to_server: Cursor::new(input),
            from_server: Vec::new(),
        };
        let engine = Mutex::new(Engine::new(EngineConfig::default()));
        let config = EngineConfig::default();
        run_session(&mut duplex, &engine, &config).unwrap();

        let mut cursor = &duplex.from_server[..];
        let header = Header::read_from(&mut cursor).unwrap();
        assert_eq!(header.status, StatusWire::IncorrectFormat);
    }
}
