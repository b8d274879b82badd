use otp_protocol::CODE_LENGTH;
use otp_protocol::code::digits_only;

/// Fixed array of single-digit slots.
///
/// A slot is either empty or holds exactly one ASCII digit; nothing else is ever stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DigitSlots {
    values: [Option<char>; CODE_LENGTH],
}

impl DigitSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.values.get(index).copied().flatten()
    }

    /// Normalizes `raw` to its last digit (or nothing) and stores it in slot `index`.
    ///
    /// Returns the stored value. Out-of-range indices are ignored.
    pub fn write_normalized(&mut self, index: usize, raw: &str) -> Option<char> {
        let slot = self.values.get_mut(index)?;
        *slot = digits_only(raw).chars().last();
        *slot
    }

    /// Writes the digits of `payload` into consecutive slots starting at slot 0.
    ///
    /// Excess digits are dropped and slots past the last pasted digit keep their value. Returns
    /// how many slots were written.
    pub fn distribute(&mut self, payload: &str) -> usize {
        let digits = digits_only(payload);
        let mut written = 0;
        for (slot, digit) in self.values.iter_mut().zip(digits.chars()) {
            *slot = Some(digit);
            written += 1;
        }
        written
    }

    pub fn assembled(&self) -> String {
        self.values.iter().flatten().collect()
    }

    pub fn is_complete(&self) -> bool {
        self.assembled().len() == CODE_LENGTH
    }
}
