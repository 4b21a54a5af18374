/// Example dialing an L2CAP LE channel, sending one frame and reading the reply
///
/// Usage: l2cap_ping <address> [psm] [message]
use rustycoc::*;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("L2CAP Ping Example");
    println!("------------------");

    let mut args = env::args().skip(1);
    let address = match args.next() {
        Some(address) => address,
        None => {
            eprintln!("Usage: l2cap_ping <address> [psm] [message]");
            return Ok(());
        }
    };
    let psm = match args.next() {
        Some(psm) => psm.parse::<u16>()?,
        None => 192,
    };
    let message = args.next().unwrap_or_else(|| "hello!".to_string());

    let endpoint = Endpoint::parse(&address, psm, AddressType::Random)?;
    println!("Dialing {}...", endpoint);

    let mut session = match ChannelSession::dial(endpoint, ConnectionParameters::default()) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Failed to dial ({:?} phase): {}", err.phase(), err);
            eprintln!("Note: This example requires a paired device and Bluetooth privileges");
            return Err(err.into());
        }
    };

    if let Some(negotiated) = session.negotiated_parameters() {
        println!(
            "Channel open: in MTU {}, out MTU {}",
            negotiated.inbound_mtu, negotiated.outbound_mtu
        );
    }

    let written = session.write(message.as_bytes())?;
    println!("Sent {} bytes", written);

    match session.read() {
        Ok(frame) => match frame.as_text() {
            Some(text) => println!("Received text: {}", text),
            None => println!("Received data: {:?}", frame.payload()),
        },
        Err(err) => eprintln!("Failed to read reply ({:?}): {}", err.kind(), err),
    }

    session.close();
    println!("Channel closed");
    Ok(())
}
