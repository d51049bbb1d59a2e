/// Linear learning-rate decay: the rate loses a fixed share of its initial
/// value on every step and reaches zero after `decay_epochs` steps.
///
/// lr(n) = initial_lr · (1 − n / decay_epochs)
pub struct LinearDecayLR {
    pub initial_lr: f64,
    pub decay_epochs: usize,
    current_lr: f64,
}

impl LinearDecayLR {
    pub fn new(initial_lr: f64, decay_epochs: usize) -> Self {
        LinearDecayLR {
            initial_lr,
            decay_epochs,
            current_lr: initial_lr,
        }
    }

    pub fn step(&mut self) {
        if self.decay_epochs == 0 {
            return;
        }
        let delta = self.initial_lr / self.decay_epochs as f64;
        self.current_lr = (self.current_lr - delta).max(0.0);
    }

    pub fn get_lr(&self) -> f64 {
        self.current_lr
    }
}
