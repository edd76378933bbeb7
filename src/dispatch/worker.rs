/// Proof that the current code runs on the blocking worker pool.
///
/// Blocking operations take `&Worker` so they cannot be called from the
/// writer thread by accident. The only way to obtain one is
/// [`Context::worker`](super::Context::worker):
///
/// ```compile_fail
/// let worker = mechanicum::Worker::new();
/// ```
///
/// The context itself cannot travel into a worker job, so state is never
/// mutated off the writer thread:
///
/// ```compile_fail
/// use mechanicum::{Context, Program};
///
/// fn leak<P: Program>(ctx: Context<P>) {
///     std::thread::spawn(move || drop(ctx));
/// }
/// ```
#[derive(Debug)]
pub struct Worker {
    _private: (),
}

impl Worker {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}
