//! 1-to-1 value transform preserving originating times.

use crate::component::{Output, Transform};
use crate::envelope::Message;
use crate::error::Result;
use std::marker::PhantomData;

/// Applies a function to every payload, re-emitting the result under the
/// input's originating time.
///
/// # Example
///
/// ```rust,ignore
/// use chronoflow::components::Map;
///
/// let (input, output) = pipeline.add_transform("celsius", Map::new(|f: &f64| (f - 32.0) / 1.8));
/// ```
pub struct Map<F, In, Out> {
    map: F,
    _types: PhantomData<fn(In) -> Out>,
}

impl<F, In, Out> Map<F, In, Out>
where
    F: FnMut(&In) -> Out,
{
    /// Create a map transform from a function.
    pub fn new(map: F) -> Self {
        Self {
            map,
            _types: PhantomData,
        }
    }
}

impl<F, In, Out> Transform for Map<F, In, Out>
where
    F: FnMut(&In) -> Out + Send + 'static,
    In: Clone + Send + 'static,
    Out: Clone + Send + 'static,
{
    type In = In;
    type Out = Out;

    fn transform(&mut self, message: &Message<In>) -> Result<Output<Out>> {
        let value = (self.map)(message.payload());
        Ok(Output::single(value, message.originating_time()))
    }
}
