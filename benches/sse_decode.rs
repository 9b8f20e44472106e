use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use graphchat::core::stream::{decode_frame, SseDecoder};
use std::hint::black_box;

fn make_body(n_chunks: usize, fragment: &str) -> Vec<u8> {
    let mut body = String::from("event: metadata\ndata: {\"run_id\":\"bench\"}\n\n");
    for i in 0..n_chunks {
        body.push_str(&format!(
            "event: messages\ndata: [{{\"type\":\"AIMessageChunk\",\"content\":\"{fragment}\",\"id\":\"run-{i}\"}},{{\"langgraph_node\":\"agent\"}}]\n\n"
        ));
    }
    body.push_str("event: end\ndata: null\n\n");
    body.into_bytes()
}

fn decode_all(body: &[u8], read_size: usize) -> usize {
    let mut decoder = SseDecoder::new();
    let mut events = 0;
    for chunk in body.chunks(read_size) {
        for frame in decoder.push(chunk) {
            events += decode_frame(&frame).map(|decoded| decoded.len()).unwrap_or(0);
        }
    }
    if let Some(frame) = decoder.finish() {
        events += decode_frame(&frame).map(|decoded| decoded.len()).unwrap_or(0);
    }
    events
}

fn bench_sse_decode(c: &mut Criterion) {
    let body = make_body(500, "Lorem ipsum dolor sit amet ");
    let mut group = c.benchmark_group("sse_decode");
    group.throughput(Throughput::Bytes(body.len() as u64));

    // Small reads split frames and UTF-8 sequences; large reads batch many frames.
    for read_size in [16usize, 512, 16 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(read_size),
            &read_size,
            |b, &read_size| b.iter(|| decode_all(black_box(&body), read_size)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_sse_decode);
criterion_main!(benches);
