//! Slice and simulated base on two threads.
//!
//! The "receive" thread plays the I2C interrupt handler: it feeds frames
//! written by the base into the bus and answers each one through the
//! router. The main thread plays the base: it waits for the interrupt line
//! and drains whatever the slice queued.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use slicebus::link::{BaseHost, QueueId, SliceBus};
use slicebus::transport::MemoryLine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let line = Arc::new(MemoryLine::new());
    let bus = Arc::new(SliceBus::new(Arc::clone(&line)));
    let base = BaseHost::new();

    let inbound = vec![
        base.frame(7, 5, b"hello")?,
        base.frame(9, 2, b"status?")?,
        base.clone().without_checksum().frame(3, 1, b"debug")?,
    ];

    let receiver = {
        let bus = Arc::clone(&bus);
        thread::spawn(move || {
            let reply = |cport: u8, payload: &[u8]| {
                let mut answer = b"ack:".to_vec();
                answer.extend_from_slice(payload);
                if let Err(err) = bus.send_data(cport, &answer) {
                    eprintln!("reply on cport {cport} failed: {err}");
                }
            };
            for frame in &inbound {
                if let Err(err) = bus.receive(frame, &reply) {
                    eprintln!("dropped frame: {err}");
                }
            }
            bus.send_control(&[0x01, 0x00])
        })
    };

    let mut received = 0;
    while received < 4 {
        if !line.is_asserted() {
            thread::sleep(Duration::from_millis(1));
            continue;
        }
        for drained in base.poll(&bus) {
            let bytes = drained.message.as_bytes();
            match drained.queue {
                QueueId::Data => eprintln!(
                    "data  host_cport={} local_cport={} payload={:?}",
                    bytes[1],
                    bytes[2],
                    String::from_utf8_lossy(&bytes[3..])
                ),
                QueueId::Control => eprintln!("control {bytes:02x?}"),
            }
            received += 1;
        }
    }

    receiver.join().map_err(|_| "receiver thread panicked")??;
    eprintln!("stats: {:?}", bus.stats());
    bus.cleanup();
    Ok(())
}
