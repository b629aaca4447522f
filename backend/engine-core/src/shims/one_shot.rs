use log::debug;

type Original<A, R> = Box<dyn FnMut(A) -> R + Send>;
type Intercept<A, R> = Box<dyn FnOnce(A) -> R + Send>;

/// Listen strategy for frameworks without a replaceable hook.
///
/// Wraps the framework's original listen function. The first call is routed
/// to the intercept and disarms it; every later call reaches the original.
/// [`restore`](Self::restore) hands the original back.
pub struct OneShotListen<A, R> {
    original: Original<A, R>,
    intercept: Option<Intercept<A, R>>,
}

impl<A, R> OneShotListen<A, R> {
    pub fn install<O, I>(original: O, intercept: I) -> Self
    where
        O: FnMut(A) -> R + Send + 'static,
        I: FnOnce(A) -> R + Send + 'static,
    {
        debug!("One-shot listen intercept installed");
        Self {
            original: Box::new(original),
            intercept: Some(Box::new(intercept)),
        }
    }

    /// True until the first call was intercepted.
    pub fn is_armed(&self) -> bool {
        self.intercept.is_some()
    }

    pub fn call(&mut self, args: A) -> R {
        match self.intercept.take() {
            Some(intercept) => {
                debug!("Intercepting first listen call");
                intercept(args)
            }
            None => (self.original)(args),
        }
    }

    /// Remove the intercept (if still armed) and return the original function.
    pub fn restore(self) -> Box<dyn FnMut(A) -> R + Send> {
        if self.intercept.is_some() {
            debug!("One-shot listen intercept removed before use");
        }
        self.original
    }
}
