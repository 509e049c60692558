use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use simview::{
    Entity, EntityKind, MAP_DIR_KEY, Record, Request, RequestFlags, Response, Session,
    SessionError, TIMESTEPS_KEY, TaskError, Transport, TransportError, codec, decode_len,
    encode_len,
};

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = encode_len(payload.len() as u32);
    out.extend_from_slice(payload);
    out
}

/// Bind an ephemeral listener and serve `parts` to the first connection,
/// pausing between writes so the client sees them as separate reads.
fn serve_bytes(parts: Vec<Vec<u8>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        for part in parts {
            if !part.is_empty() {
                stream.write_all(&part).unwrap();
                stream.flush().unwrap();
            }
            thread::sleep(Duration::from_millis(10));
        }
    });
    addr
}

fn read_request_frame(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        if let Some((len, consumed)) = decode_len(&buf).unwrap() {
            if buf.len() >= consumed + len as usize {
                return Some(buf[consumed..consumed + len as usize].to_vec());
            }
        }
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..read]);
    }
}

#[test]
fn reassembly_at_every_split_point() {
    let payload = b"hello simulation".to_vec();
    let framed = frame(&payload);

    for split in 0..=framed.len() {
        let addr = serve_bytes(vec![framed[..split].to_vec(), framed[split..].to_vec()]);
        let mut transport = Transport::connect(addr).unwrap();
        let task = transport.receive().expect("transport should be alive");
        assert_eq!(task.result().unwrap(), payload, "split at {split}");
    }
}

#[test]
fn reassembly_of_multi_chunk_payload() {
    // Larger than the transport's read chunk, with a two-byte prefix.
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    let addr = serve_bytes(vec![frame(&payload)]);

    let mut transport = Transport::connect(addr).unwrap();
    let task = transport.receive().unwrap();
    assert_eq!(task.result().unwrap(), payload);
}

#[test]
fn empty_payload_frame() {
    let addr = serve_bytes(vec![frame(&[])]);
    let mut transport = Transport::connect(addr).unwrap();
    let task = transport.receive().unwrap();
    assert_eq!(task.result().unwrap(), Vec::<u8>::new());
}

#[test]
fn repeated_receive_coalesces_onto_the_pending_task() {
    let payload = b"late frame".to_vec();
    let framed = frame(&payload);
    let addr = serve_bytes(vec![Vec::new(), Vec::new(), framed]);

    let mut transport = Transport::connect(addr).unwrap();
    let first = transport.receive().unwrap();
    let second = transport.receive().unwrap();
    assert!(first.ptr_eq(&second));

    assert_eq!(first.result().unwrap(), payload);
    assert!(second.is_success());
}

#[test]
fn peer_close_fails_the_receive_and_kills_the_transport() {
    let addr = serve_bytes(vec![]);
    let mut transport = Transport::connect(addr).unwrap();

    let task = transport.receive().unwrap();
    match task.result() {
        Err(TaskError::Failed(TransportError::Closed)) => {}
        other => panic!("expected Closed, got {other:?}"),
    }
    assert!(!task.is_success());
    assert!(!transport.is_alive());
    assert!(transport.receive().is_none());
    assert!(transport.send(b"too late").is_none());
}

#[test]
fn aborting_a_pending_receive() {
    // Server never writes; the read only unblocks when we close the stream.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let holder = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(300));
        drop(stream);
    });

    let mut transport = Transport::connect(addr).unwrap();
    let task = transport.receive().unwrap();
    task.abort();
    assert!(matches!(task.result(), Err(TaskError::Aborted)));
    assert!(!task.is_success());

    transport.close();
    holder.join().unwrap();
}

#[test]
fn session_mirrors_snapshots_and_deltas() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        // Round 1: OPEN gets config plus a full snapshot.
        let request: Request =
            codec::decode(&read_request_frame(&mut stream).unwrap()).unwrap();
        assert!(request.flags().contains(RequestFlags::OPEN));

        let mut config = HashMap::new();
        config.insert(MAP_DIR_KEY.to_string(), "maps/kobe".to_string());
        config.insert(TIMESTEPS_KEY.to_string(), "300".to_string());

        let mut road = Entity::new(70, "Road");
        road.x = Some(120);
        let mut civilian = Entity::new(9, "Civilian");
        civilian.hp = Some(10000);
        civilian.x = Some(40);

        let snapshot = Response {
            request: request.request,
            message: "open".to_string(),
            result: Some(true),
            time: Some(1),
            record: Some(Record {
                time: 1,
                world: Some(vec![road, civilian]),
                config: Some(config),
                ..Record::default()
            }),
        };
        stream
            .write_all(&frame(&codec::encode(&snapshot).unwrap()))
            .unwrap();

        // Round 2: UPDATE gets a delta for the civilian only.
        let request: Request =
            codec::decode(&read_request_frame(&mut stream).unwrap()).unwrap();
        assert!(request.flags().contains(RequestFlags::UPDATE));
        assert_eq!(request.time, Some(2));

        let mut delta = Entity::new(9, "Civilian");
        delta.hp = Some(9500);
        let update = Response {
            request: request.request,
            message: "update".to_string(),
            result: Some(true),
            time: Some(2),
            record: Some(Record {
                time: 2,
                changes: Some(vec![delta]),
                ..Record::default()
            }),
        };
        stream
            .write_all(&frame(&codec::encode(&update).unwrap()))
            .unwrap();
        // Dropping the stream ends the session.
    });

    let mut session = Session::connect(addr).unwrap();

    let response = session
        .exchange(&Request::new(
            RequestFlags::OPEN | RequestFlags::WORLD | RequestFlags::CONFIG,
        ))
        .unwrap();
    assert_eq!(response.result, Some(true));
    assert_eq!(session.world().map_name(), Some("maps/kobe"));
    assert_eq!(session.world().max_time_step(), 300);
    assert_eq!(session.world().time(), 1);
    assert_eq!(session.world().entity_count(), 2);
    assert_eq!(session.world().count_of(EntityKind::Road), 1);

    let response = session
        .exchange(&Request::new(RequestFlags::UPDATE).with_time(2))
        .unwrap();
    assert_eq!(response.time, Some(2));
    assert_eq!(session.world().time(), 2);

    let civilian = session.world().entity(9).unwrap();
    assert_eq!(civilian.hp, Some(9500));
    assert_eq!(civilian.x, Some(40)); // untouched by the delta

    // The server is gone; the next receive ends the session.
    match session.receive() {
        Err(SessionError::Transport(TransportError::Closed)) => {}
        other => panic!("expected end of session, got {other:?}"),
    }

    server.join().unwrap();
    session.close();
    assert!(!session.is_open());
}
