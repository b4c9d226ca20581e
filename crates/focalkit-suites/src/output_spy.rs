//! Character output spy in the style of Unity's `UnityOutputCharSpy`.
//!
//! While enabled, characters are captured into a fixed-size zero-filled
//! buffer that always keeps its last byte as a terminator. While disabled,
//! they go to the passthrough sink instead.

use focalkit_harness::{Suite, TestContext, expect_eq, expect_false, expect_true};

pub const SUITE: &str = "output_spy";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutputSpy {
    buffer: Vec<u8>,
    count: usize,
    enabled: bool,
    passthrough: Vec<u8>,
}

impl OutputSpy {
    /// Buffer of `max(size, 0)` zero bytes, capture disabled.
    #[must_use]
    pub fn create(size: i32) -> Self {
        let size = usize::try_from(size).unwrap_or(0);
        Self {
            buffer: vec![0; size],
            count: 0,
            enabled: false,
            passthrough: Vec::new(),
        }
    }

    pub fn enable(&mut self, enable: bool) {
        self.enabled = enable;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn output_char(&mut self, c: u8) {
        if !self.enabled {
            self.passthrough.push(c);
            return;
        }
        if self.count + 1 < self.buffer.len() {
            self.buffer[self.count] = c;
            self.count += 1;
        }
    }

    pub fn output_str(&mut self, s: &str) {
        for b in s.bytes() {
            self.output_char(b);
        }
    }

    /// The raw buffer, terminator included.
    #[must_use]
    pub fn get(&self) -> &[u8] {
        &self.buffer
    }

    /// Captured text up to the first zero byte.
    #[must_use]
    pub fn text(&self) -> String {
        let end = self
            .buffer
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.buffer.len());
        String::from_utf8_lossy(&self.buffer[..end]).into_owned()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn passthrough(&self) -> &[u8] {
        &self.passthrough
    }

    pub fn destroy(&mut self) {
        self.buffer = Vec::new();
        self.count = 0;
    }
}

fn create_zero_fills(ctx: &mut TestContext<'_>) {
    let spy = OutputSpy::create(5);
    expect_eq!(ctx, spy.capacity(), 5);
    expect_eq!(ctx, spy.get(), [0_u8; 5].as_slice());
    expect_false!(ctx, spy.is_enabled());
}

fn create_degenerate_sizes(ctx: &mut TestContext<'_>) {
    for size in [0, -5] {
        let mut spy = OutputSpy::create(size);
        expect_eq!(ctx, spy.capacity(), 0, "create({size}) is empty");
        spy.enable(true);
        spy.output_char(b'x');
        expect_eq!(ctx, spy.text(), "", "create({size}) captures nothing");
    }
}

fn capture_keeps_terminator(ctx: &mut TestContext<'_>) {
    let mut spy = OutputSpy::create(5);
    spy.enable(true);
    spy.output_str("abcdef");
    expect_eq!(ctx, spy.text(), "abcd");
    expect_eq!(ctx, spy.get()[4], 0, "last byte stays a terminator");
    expect_true!(ctx, spy.passthrough().is_empty());
}

fn disabled_passes_through(ctx: &mut TestContext<'_>) {
    let mut spy = OutputSpy::create(8);
    spy.output_str("hi");
    expect_eq!(ctx, spy.passthrough(), b"hi".as_slice());
    expect_eq!(ctx, spy.text(), "");
    spy.enable(true);
    spy.output_char(b'!');
    spy.enable(false);
    spy.output_char(b'?');
    expect_eq!(ctx, spy.text(), "!");
    expect_eq!(ctx, spy.passthrough(), b"hi?".as_slice());
}

fn destroy_releases_buffer(ctx: &mut TestContext<'_>) {
    let mut spy = OutputSpy::create(4);
    spy.enable(true);
    spy.output_char(b'z');
    spy.destroy();
    expect_eq!(ctx, spy.capacity(), 0);
    spy.output_char(b'y');
    expect_eq!(ctx, spy.text(), "");
}

#[must_use]
pub fn suite() -> Suite {
    Suite::new(SUITE, "UnityOutputCharSpy")
        .case("create_zero_fills", "create(5) yields five zero bytes", create_zero_fills)
        .case(
            "create_degenerate_sizes",
            "create(0) and create(-5) yield a usable empty buffer",
            create_degenerate_sizes,
        )
        .case(
            "capture_keeps_terminator",
            "capture stops one byte short of capacity",
            capture_keeps_terminator,
        )
        .case(
            "disabled_passes_through",
            "disabled spy forwards to passthrough",
            disabled_passes_through,
        )
        .case("destroy_releases_buffer", "destroy empties the spy", destroy_releases_buffer)
}
