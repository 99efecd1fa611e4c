use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use packet_tap::{
    Connection, FramePacket, ListenerError, ListenerFilter, PacketAccess, PacketIdentity,
    PacketListener, PacketTap, Priority, ProtocolPhase, ProtocolRegistry, RawPacket, SendEvent,
    protocol::Direction,
};

const KEEP_ALIVE: PacketIdentity = PacketIdentity::new("ClientboundKeepAlive");

struct ReadId;

impl PacketListener for ReadId {
    fn on_send(&self, event: &mut SendEvent) -> Result<(), ListenerError> {
        std::hint::black_box(event.packet_id());
        Ok(())
    }
}

fn bench_tap(listeners: usize) -> (PacketTap, Connection) {
    let registry = ProtocolRegistry::builder(765)
        .insert(ProtocolPhase::Play, Direction::Send, KEEP_ALIVE, 0x10)
        .unwrap()
        .build();
    let tap = PacketTap::new(registry);
    for i in 0..listeners {
        tap.listeners().register(
            Arc::new(ReadId),
            Priority::Normal,
            ListenerFilter::any(),
            format!("read-id-{i}"),
        );
    }
    let mut conn = Connection::new("127.0.0.1:25565".parse().unwrap());
    conn.advance(ProtocolPhase::Play);
    (tap, conn)
}

fn packet() -> Box<dyn RawPacket> {
    Box::new(FramePacket::new(KEEP_ALIVE, vec![0u8; 8]))
}

fn dispatch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_send");

    for listeners in [0usize, 1, 8, 64] {
        let (tap, conn) = bench_tap(listeners);
        group.bench_function(format!("{listeners}_listeners"), |b| {
            b.iter(|| {
                let d = tap.on_send(&conn, conn.channel(), packet());
                std::hint::black_box(d.proceed)
            })
        });
    }

    group.finish();
}

fn resolve_benchmark(c: &mut Criterion) {
    let registry = ProtocolRegistry::builder(765)
        .insert(ProtocolPhase::Play, Direction::Send, KEEP_ALIVE, 0x10)
        .unwrap()
        .build();

    c.bench_function("registry_resolve", |b| {
        b.iter(|| {
            std::hint::black_box(registry.resolve(
                ProtocolPhase::Play,
                Direction::Send,
                std::hint::black_box(KEEP_ALIVE),
            ))
        })
    });
}

criterion_group!(benches, dispatch_benchmark, resolve_benchmark);
criterion_main!(benches);
