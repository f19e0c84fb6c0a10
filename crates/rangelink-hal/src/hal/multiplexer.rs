// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use embedded_hal::i2c::{Error as _, I2c};

use crate::{HalError, HalResult};

/// Factory address of a TCA9548A (A0..A2 low)
pub const DEFAULT_MULTIPLEXER_ADDRESS: u8 = 0x70;

/// Downstream channels on a TCA9548A
pub const MAX_CHANNELS: u8 = 8;

/// TCA9548A 1-to-8 I2C multiplexer
///
/// The control register is a bitmask of enabled downstream channels. Exactly
/// one bit is set at a time so identical sensors on different channels never
/// answer together.
pub struct Tca9548a<I2C> {
    i2c: I2C,
    address: u8,
    selected: Option<u8>,
}

impl<I2C: I2c> Tca9548a<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            selected: None,
        }
    }

    /// Route the bus to `channel`
    pub fn select(&mut self, channel: u8) -> HalResult<()> {
        if channel >= MAX_CHANNELS {
            return Err(HalError::InvalidChannel {
                channel,
                max: MAX_CHANNELS - 1,
            });
        }
        self.write_control(1 << channel)?;
        self.selected = Some(channel);
        Ok(())
    }

    /// Disconnect every downstream channel
    pub fn disable_all(&mut self) -> HalResult<()> {
        self.write_control(0)?;
        self.selected = None;
        Ok(())
    }

    /// Channel most recently selected
    pub fn selected(&self) -> Option<u8> {
        self.selected
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Borrow the upstream bus (for drivers sharing it)
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Give back the upstream bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_control(&mut self, mask: u8) -> HalResult<()> {
        self.i2c.write(self.address, &[mask]).map_err(|e| {
            HalError::bus(format!(
                "multiplexer 0x{:02X} control write failed: {:?}",
                self.address,
                e.kind()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Default)]
    struct RecordingI2c {
        writes: Vec<(u8, Vec<u8>)>,
        fail: bool,
    }

    impl ErrorType for RecordingI2c {
        type Error = ErrorKind;
    }

    impl I2c for RecordingI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            for op in operations.iter() {
                if let Operation::Write(bytes) = op {
                    self.writes.push((address, bytes.to_vec()));
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_select_writes_single_bit() {
        let mut mux = Tca9548a::new(RecordingI2c::default(), DEFAULT_MULTIPLEXER_ADDRESS);
        mux.select(0).unwrap();
        mux.select(5).unwrap();
        mux.disable_all().unwrap();

        let i2c = mux.release();
        assert_eq!(
            i2c.writes,
            vec![(0x70, vec![0b0000_0001]), (0x70, vec![0b0010_0000]), (0x70, vec![0])]
        );
    }

    #[test]
    fn test_select_out_of_range() {
        let mut mux = Tca9548a::new(RecordingI2c::default(), 0x71);
        let err = mux.select(8).unwrap_err();
        assert_eq!(err, HalError::InvalidChannel { channel: 8, max: 7 });
        assert_eq!(mux.selected(), None);
        assert!(mux.release().writes.is_empty());
    }

    #[test]
    fn test_bus_failure_keeps_previous_selection() {
        let mut mux = Tca9548a::new(RecordingI2c::default(), 0x70);
        mux.select(2).unwrap();
        mux.i2c_mut().fail = true;

        assert!(matches!(mux.select(3), Err(HalError::Bus(_))));
        assert_eq!(mux.selected(), Some(2));
    }
}
