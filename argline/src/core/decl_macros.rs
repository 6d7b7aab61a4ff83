// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Simple macro to create a [`Result`] with an [`Ok`] variant. It is just syntactic sugar
/// that helps having to write `Ok(())`.
/// - If no arg is passed in then it will return `Ok(())`.
/// - If an arg is passed in then it will return `Ok($arg)`.
#[macro_export]
macro_rules! ok {
    // No args.
    () => {
        Ok(())
    };
    // With arg.
    ($value:expr) => {
        Ok($value)
    };
}

/// Send a [`crate::LineStateControlSignal`] on the channel held by a
/// [`crate::SharedWriter`] and await it. Evaluates to the result of the `send`, which is
/// an error once the output monitor task is gone.
#[macro_export]
macro_rules! send_signal {
    ($shared_writer:expr, $signal:expr) => {
        $shared_writer
            .line_state_control_channel_sender
            .send($signal)
            .await
    };
}

#[cfg(test)]
mod tests {
    fn returns_unit() -> Result<(), String> { ok!() }

    fn returns_value() -> Result<u8, String> { ok!(42) }

    #[test]
    fn test_ok_macro() {
        assert_eq!(returns_unit(), Ok(()));
        assert_eq!(returns_value(), Ok(42));
    }
}
