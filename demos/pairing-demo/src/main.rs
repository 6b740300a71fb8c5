//! Walkthrough of the pairing flow, driving the store in-process.
//!
//! In production both devices hit the HTTP procedures on their own
//! timers (heartbeat every `HEARTBEAT_INTERVAL`, poll every
//! `POLL_INTERVAL`); here the steps run back to back so the whole
//! exchange is visible at once.

use beamlink_protocol::{MessageInput, Role, HEARTBEAT_INTERVAL, POLL_INTERVAL};
use beamlink_store::RoomStore;
use serde_json::json;

fn main() {
    let mut store = RoomStore::default();

    // Projector side: open a room and render its id as a QR code.
    let room = store.create_room();
    println!("projector: opened room {room}");
    store.heartbeat(&room, Role::Projector);

    // Admin side: scan the code, validate, announce.
    assert!(store.join_room(&room));
    let status = store.heartbeat(&room, Role::Admin);
    println!(
        "admin:     joined, projector connected = {}",
        status.peer_connected
    );
    println!(
        "           (both sides now heartbeat every {HEARTBEAT_INTERVAL:?} \
         and poll every {POLL_INTERVAL:?})"
    );

    // Admin reports a scan upstream.
    let id = store.send(
        &room,
        "upstream",
        MessageInput::new("NFC_SCANNED", json!({ "nfcId": "tag-7" })),
    );
    println!("admin:     sent NFC_SCANNED as message {id}");

    // Projector polls upstream from its cursor.
    let upstream = store.poll(&room, "upstream", 0);
    for msg in &upstream.messages {
        println!("projector: received {} (id {})", msg.kind, msg.id);
    }
    let projector_cursor = upstream.last_id;

    // Projector acknowledges downstream; admin polls it.
    store.send(
        &room,
        "downstream",
        MessageInput::new("SCAN_ACK", json!({ "accepted": true })),
    );
    let downstream = store.poll(&room, "downstream", 0);
    for msg in &downstream.messages {
        println!("admin:     received {} (id {})", msg.kind, msg.id);
    }

    // A relay-wide event lands in every display room.
    store.broadcast(
        "projector",
        &MessageInput::new("item:awarded", json!({ "itemId": "rare-3" })),
    );
    let events = store.poll(&room, "projector", 0);
    println!(
        "projector: broadcast channel has {} event(s)",
        events.messages.len()
    );

    // Quiet channels leave the cursor where it was.
    let quiet = store.poll(&room, "upstream", projector_cursor);
    println!(
        "projector: nothing new upstream (cursor stays at {})",
        quiet.last_id
    );

    // Projector closes; the paired room lingers until the TTL sweep.
    store.disconnect(&room, Role::Projector);
    let status = store.heartbeat(&room, Role::Admin);
    println!(
        "admin:     projector connected = {} after disconnect",
        status.peer_connected
    );
}
