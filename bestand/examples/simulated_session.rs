//! Console session against a simulated device
//!
//! Reads commands from stdin (`h` for help). Set `RUST_LOG=debug` to see the
//! protocol traffic.

use std::io::BufRead;

use bestand::transport::MockTransport;
use bestand::{Ingest, Session, SessionController};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    
    let session = Session::new();
    let transport = MockTransport::new()
        .with_address("DE:AD:BE:EF:00:01")
        .with_echo(session.clone());
    let mut controller = SessionController::new(transport, session.clone());
    
    // What a freshly connected device reports
    if let Ingest::Updated { image, .. } = session.ingest(&[0x0a, 0x07, 80, 30, 45, 0x10, 10, 0, 0, 0])? {
        println!("✓ Connected: {}", controller.device_info()?);
        println!("-- {} --", image);
    }
    
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        
        match controller.handle_line(&line).await {
            Ok(reply) => {
                println!("{}", reply.message);
                if !reply.keep_going {
                    break;
                }
            }
            Err(e) if e.is_session_lost() => {
                println!("Device disconnected.");
                break;
            }
            Err(e) => println!("{}", e),
        }
        
        if session.output_enabled() {
            if let Ok(image) = session.snapshot() {
                println!("-- {} --", image);
            }
        }
    }
    
    Ok(())
}
