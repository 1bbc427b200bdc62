// In crates/engine/src/feed.rs

use core_types::Bar;
use futures::Stream;
use futures::stream;

/// A finite, in-memory bar feed. Bars are yielded in the order given.
pub fn from_bars(bars: Vec<Bar>) -> impl Stream<Item = Bar> + Unpin + Send {
    stream::iter(bars)
}
