use crate::component::{Component, ComponentRegistry};
use crate::context::TickContext;

/// Marks its owner for deletion once the countdown runs out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime {
    remaining: f32,
    expired: bool,
}

impl Lifetime {
    pub const DEFAULT_SECONDS: f32 = 1.0;

    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds,
            expired: false,
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SECONDS)
    }
}

impl Component for Lifetime {
    fn update(&mut self, _siblings: &mut ComponentRegistry, ctx: &mut TickContext<'_>) {
        if self.expired {
            return;
        }
        self.remaining -= ctx.dt;
        if self.remaining <= 0.0 {
            self.expired = true;
            ctx.mark_for_deletion(ctx.owner);
        }
    }
}
