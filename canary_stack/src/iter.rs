use core::ops::Range;

use crate::capacity::SlotBuffer;
use crate::protection::Protection;
use crate::sentinel::Elem;
use crate::stack::Stack;

/// Iterator over the live elements of a `Stack`, bottom to top.
///
/// This iterator implements `Clone`.
#[derive(Clone)]
pub struct StackIter<'a> {
    buffer: Option<&'a SlotBuffer>,
    range: Range<usize>,
}

impl<'a> Iterator for StackIter<'a> {
    type Item = Elem;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.range.next()?;
        self.buffer?.get(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl DoubleEndedIterator for StackIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let index = self.range.next_back()?;
        self.buffer?.get(index)
    }
}

impl ExactSizeIterator for StackIter<'_> {}

impl<'a, P: Protection> IntoIterator for &'a Stack<P> {
    type Item = Elem;
    type IntoIter = StackIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        match self.live_buffer() {
            Some((buffer, size)) => StackIter {
                buffer: Some(buffer),
                range: 0..size.min(buffer.capacity()),
            },
            None => StackIter {
                buffer: None,
                range: 0..0,
            },
        }
    }
}
