use html_api::html_processor::HtmlProcessor;
use html_api::tag_processor::TagProcessor;

const SECTION: &str = r#"<section class="chapter" id="c1"><h2>Heading &amp; more</h2>
<p>Some <b>bold</b> and <i>italic</i> text with a <a href="/link?a=1&amp;b=2">link</a>.
<ul><li>One<li>Two<li>Three</ul>
<table><tr><th>Key<th>Value<tr><td>a<td>1</table>
<!-- comment --><pre>
preformatted</pre><svg viewBox="0 0 10 10"><circle r="5"/></svg>
<script>if (a < b) { document.write("<p>"); }</script></section>
"#;

fn input() -> Vec<u8> {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Bench</title></head><body>");
    for _ in 0..500 {
        html.push_str(SECTION);
    }
    html.into_bytes()
}

fn main() {
    divan::main();
}

#[divan::bench(skip_ext_time = true)]
fn bench_html_processor(bencher: divan::Bencher) {
    let html = input();
    bencher.bench(|| {
        let mut processor =
            HtmlProcessor::create_full_parser(&html).expect("Processor must read input");
        while processor.next_token() {}
        processor
    });
}

#[divan::bench(skip_ext_time = true)]
fn bench_tag_processor(bencher: divan::Bencher) {
    let html = input();
    bencher.bench(|| {
        let mut processor = TagProcessor::new(&html);
        while processor.next_token() {}
        processor
    });
}

#[divan::bench(skip_ext_time = true)]
fn bench_normalize(bencher: divan::Bencher) {
    let html = input();
    bencher.bench(|| HtmlProcessor::normalize(&html));
}
