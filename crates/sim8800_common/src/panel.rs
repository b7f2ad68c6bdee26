//! Interfaces between the front panel controller and whatever draws the
//! switches and lights.
//!
//! A frontend (terminal, SDL window, web page) implements these traits and
//! hands boxed instances to the controller once, at construction. Every
//! collaborator is optional; the controller skips the feature when one is
//! missing.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Source of the 16 toggle switches (A0–A15 / D0–D7 sense switches).
///
/// Sampled synchronously whenever examine/deposit runs or the CPU reads port
/// 0xFF.
pub trait SwitchInput {
    fn current_word(&self) -> u16;
}

/// Receiver for the panel lights.
///
/// Calls are level-triggered: the controller may repeat identical values and
/// implementations must tolerate that. Bit arrays are least significant bit
/// first.
pub trait IndicatorSink {
    fn set_address_indicators(&mut self, bits: [bool; 16]);
    fn set_data_indicators(&mut self, bits: [bool; 8]);
    fn set_wait_indicator(&mut self, on: bool);
    fn set_status_indicators(&mut self, ready: bool);
}

/// Receiver for the textual CPU and memory monitors.
pub trait DebugSink {
    fn dump_cpu(&mut self, text: &str);
    fn dump_mem(&mut self, text: &str);
}

impl SwitchInput for u16 {
    fn current_word(&self) -> u16 {
        *self
    }
}

impl SwitchInput for Rc<Cell<u16>> {
    fn current_word(&self) -> u16 {
        self.get()
    }
}

impl<T: SwitchInput> SwitchInput for Rc<RefCell<T>> {
    fn current_word(&self) -> u16 {
        self.borrow().current_word()
    }
}

// Shared handles let the frontend keep reading what the controller wrote.
impl<T: IndicatorSink> IndicatorSink for Rc<RefCell<T>> {
    fn set_address_indicators(&mut self, bits: [bool; 16]) {
        self.borrow_mut().set_address_indicators(bits);
    }

    fn set_data_indicators(&mut self, bits: [bool; 8]) {
        self.borrow_mut().set_data_indicators(bits);
    }

    fn set_wait_indicator(&mut self, on: bool) {
        self.borrow_mut().set_wait_indicator(on);
    }

    fn set_status_indicators(&mut self, ready: bool) {
        self.borrow_mut().set_status_indicators(ready);
    }
}

impl<T: DebugSink> DebugSink for Rc<RefCell<T>> {
    fn dump_cpu(&mut self, text: &str) {
        self.borrow_mut().dump_cpu(text);
    }

    fn dump_mem(&mut self, text: &str) {
        self.borrow_mut().dump_mem(text);
    }
}
