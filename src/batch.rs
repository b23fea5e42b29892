//! Many independent conversions at once.
//!
//! Conversions share nothing, so with the `parallel` feature each request
//! runs as its own Rayon task. Without it the requests run one after another.
//! Either way the results come back in request order, one per request; a
//! rejected input does not stop the others.

use crate::error::ConvertError;
use crate::pipeline::{convert, ConversionRequest, ConversionResult};

pub fn convert_batch(
    requests: &[ConversionRequest<'_>],
) -> Vec<Result<ConversionResult, ConvertError>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        requests.par_iter().map(convert).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        requests.iter().map(convert).collect()
    }
}
