//! Benchmarks for the typed call path.
//!
//! Performance-critical paths:
//! - `ServiceDispatcher::dispatch`: argument decode, handler, reply encode
//! - `Client::call`: full round trip over the loopback network
//! - `PeerDirectory::peers`: snapshot taken on every call

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshlink::keyvalue::{key_value_service, GetArgs, KeyValueClient, MemoryStore, KEY_VALUE_SERVICE};
use meshlink::peers::{PeerAddress, PeerDirectory};
use meshlink::rpc::{Client, Context, LoopbackNetwork, Payload, Server};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = runtime();
    let store = Arc::new(MemoryStore::new());
    let service = key_value_service(Arc::clone(&store)).unwrap();

    let mut group = c.benchmark_group("dispatch/server");
    for size in [16usize, 1024, 16 * 1024] {
        let key = format!("key-{size}");
        rt.block_on(async {
            use meshlink::keyvalue::KeyValue;
            store
                .set(&Context::with_timeout(Duration::from_secs(1)), &key, &"x".repeat(size))
                .await
                .unwrap();
        });
        let args = Payload::encode(&GetArgs { key }).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &args, |b, args| {
            b.to_async(&rt).iter(|| async {
                let ctx = Context::with_timeout(Duration::from_secs(1));
                black_box(service.dispatch("Get", ctx, args.clone()).await.unwrap())
            });
        });
    }
    group.finish();

    c.bench_function("dispatch/unknown_method", |b| {
        b.to_async(&rt).iter(|| async {
            let ctx = Context::with_timeout(Duration::from_secs(1));
            black_box(service.dispatch("Delete", ctx, Payload::default()).await.is_err())
        });
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let rt = runtime();
    let network = LoopbackNetwork::new();
    let address = PeerAddress::new("127.0.0.1:4040").unwrap();
    let store = Arc::new(MemoryStore::new());
    network.listen(
        address.clone(),
        Arc::new(Server::new().with_service(key_value_service(store).unwrap())),
    );

    let directory = PeerDirectory::new();
    directory.add(KEY_VALUE_SERVICE, address);
    let kv = KeyValueClient::new(&Client::new(Arc::new(network), directory, KEY_VALUE_SERVICE));
    rt.block_on(kv.set(&Context::with_timeout(Duration::from_secs(1)), "k", "v"))
        .unwrap();

    c.bench_function("client/get_round_trip", |b| {
        b.to_async(&rt).iter(|| async {
            let ctx = Context::with_timeout(Duration::from_secs(1));
            black_box(kv.get(&ctx, "k").await.unwrap())
        });
    });

    c.bench_function("client/get_not_found", |b| {
        b.to_async(&rt).iter(|| async {
            let ctx = Context::with_timeout(Duration::from_secs(1));
            black_box(kv.get(&ctx, "missing").await.is_err())
        });
    });
}

fn bench_directory(c: &mut Criterion) {
    let mut group = c.benchmark_group("peers/snapshot");
    for count in [1usize, 16, 256] {
        let directory = PeerDirectory::new();
        for i in 0..count {
            let port = u16::try_from(1000 + i).unwrap();
            directory.add("svc", PeerAddress::new(&format!("10.0.0.1:{port}")).unwrap());
        }
        group.bench_with_input(BenchmarkId::from_parameter(count), &directory, |b, d| {
            b.iter(|| black_box(d.peers("svc")));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_round_trip, bench_directory);
criterion_main!(benches);
