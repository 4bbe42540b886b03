use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tether::core::markup::{NoopHighlighter, RenderPipeline};
use tether::core::stream::StreamAccumulator;
use tether::core::transcript::Transcript;
use tether::ui::markdown::MarkdownRenderer;
use tether::ui::theme::Theme;
use tether::utils::syntax::SyntectHighlighter;

const REPLY: &str = "Here is a **short** answer with `inline code`.\n\n\
- first point\n- second point\n\n\
```rust\nfn main() {\n    println!(\"hello\");\n}\n```\n\n\
And a closing paragraph that runs on for a while before the end.\n";

/// Splits the reply into small fragments, the way a server streams tokens.
fn fragments(reply: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = reply.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

fn stream_reply(pipeline: &RenderPipeline, parts: &[String]) {
    let mut transcript = Transcript::new();
    let mut stream = StreamAccumulator::new();
    if stream.begin(&mut transcript).is_err() {
        return;
    }
    for part in parts {
        stream.append(part, &mut transcript, pipeline);
    }
    stream.end();
}

fn bench_stream_render(c: &mut Criterion) {
    let theme = Theme::dark_default();
    let pipelines = [
        ("plain", RenderPipeline::plain()),
        (
            "markdown",
            RenderPipeline::new(
                Box::new(MarkdownRenderer::new(theme.clone())),
                Box::new(NoopHighlighter),
            ),
        ),
        (
            "markdown_syntax",
            RenderPipeline::new(
                Box::new(MarkdownRenderer::new(theme.clone())),
                Box::new(SyntectHighlighter::new(theme.clone())),
            ),
        ),
    ];

    for &size in &[4usize, 32usize] {
        let parts = fragments(&REPLY.repeat(4), size);
        let mut group = c.benchmark_group(format!("stream_append_fragment{size}"));
        group.throughput(Throughput::Elements(parts.len() as u64));
        for (name, pipeline) in &pipelines {
            group.bench_function(BenchmarkId::new(*name, size), |b| {
                b.iter(|| stream_reply(pipeline, &parts))
            });
        }
        group.finish();
    }
}

criterion_group!(benches, bench_stream_render);
criterion_main!(benches);
