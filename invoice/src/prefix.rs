//! Tokenizes and renders the bech32 human-readable prefix: `"ln" network amount?`.

use crate::error::InvoiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    Signet,
}

impl Network {
    fn tag(self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
            Network::Regtest => "bcrt",
            Network::Signet => "sb",
        }
    }

    fn from_tag(tag: &str) -> Result<Self, InvoiceError> {
        match tag {
            "bc" => Ok(Network::Mainnet),
            "tb" => Ok(Network::Testnet),
            "bcrt" => Ok(Network::Regtest),
            "sb" => Ok(Network::Signet),
            other => Err(InvoiceError::UnknownNetwork(other.to_string())),
        }
    }
}

/// An invoice amount: either unspecified, or an exact positive integer
/// number of pico-units of the base asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Amount {
    Unspecified,
    Pico(u64),
}

const MULTIPLIERS: [(char, u64); 4] = [('m', 1_000_000_000), ('u', 1_000_000), ('n', 1_000), ('p', 1)];
const NO_MULTIPLIER_FACTOR: u64 = 1_000_000_000_000;

fn factor_for(letter: char) -> Result<u64, InvoiceError> {
    MULTIPLIERS
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, f)| *f)
        .ok_or_else(|| InvoiceError::InvalidAmount(format!("unknown multiplier '{letter}'")))
}

/// The parsed prefix: a network tag and an optional amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub network: Network,
    pub amount: Amount,
}

impl Prefix {
    /// Two-pass tokenize-then-validate: split the characters first, then
    /// check each piece, instead of interleaving the digit-required check
    /// with the scan as the letter-by-letter grammars often do.
    pub fn parse(hrp: &str) -> Result<Self, InvoiceError> {
        let rest = hrp
            .strip_prefix("ln")
            .ok_or_else(|| InvoiceError::MalformedPrefix(format!("HRP {hrp:?} does not start with 'ln'")))?;

        let network_end = rest
            .find(|c: char| !c.is_ascii_lowercase())
            .unwrap_or(rest.len());
        let (network_tag, amount_part) = rest.split_at(network_end);
        let network = Network::from_tag(network_tag)?;

        if amount_part.is_empty() {
            return Ok(Self {
                network,
                amount: Amount::Unspecified,
            });
        }

        let digit_end = amount_part
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(amount_part.len());
        let (digits, multiplier_part) = amount_part.split_at(digit_end);

        if digits.is_empty() {
            return Err(InvoiceError::MalformedPrefix(
                "amount multiplier with no preceding digits".into(),
            ));
        }
        let mut multiplier_chars = multiplier_part.chars();
        let multiplier = multiplier_chars
            .next()
            .ok_or_else(|| InvoiceError::MalformedPrefix("amount digits with no multiplier letter".into()))?;
        if multiplier_chars.next().is_some() || !multiplier.is_ascii_lowercase() {
            return Err(InvoiceError::MalformedPrefix(format!(
                "unexpected trailing characters after amount in {hrp:?}"
            )));
        }

        let digit_value: u64 = digits
            .parse()
            .map_err(|_| InvoiceError::InvalidAmount(format!("amount digits overflow: {digits}")))?;
        let factor = factor_for(multiplier)?;
        let pico = digit_value
            .checked_mul(factor)
            .ok_or_else(|| InvoiceError::InvalidAmount("amount overflows pico-unit representation".into()))?;
        if pico == 0 {
            return Err(InvoiceError::InvalidAmount(
                "amount must be strictly positive when specified".into(),
            ));
        }

        Ok(Self {
            network,
            amount: Amount::Pico(pico),
        })
    }

    /// Renders `ln<network><amount>`, picking the shortest multiplier (the
    /// fewest significant digits), preferring a higher-value multiplier on
    /// ties between equally short encodings.
    pub fn render(&self) -> String {
        let mut out = String::from("ln");
        out.push_str(self.network.tag());
        match self.amount {
            Amount::Unspecified => {}
            Amount::Pico(pico) => {
                out.push_str(&render_amount(pico));
            }
        }
        out
    }
}

fn render_amount(pico: u64) -> String {
    if pico % NO_MULTIPLIER_FACTOR == 0 {
        return (pico / NO_MULTIPLIER_FACTOR).to_string();
    }
    for (letter, factor) in MULTIPLIERS {
        if pico % factor == 0 {
            return format!("{}{}", pico / factor, letter);
        }
    }
    // `p` (factor 1) always divides evenly, so this is unreachable.
    format!("{pico}p")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lnbc_with_no_amount() {
        let prefix = Prefix::parse("lnbc").unwrap();
        assert_eq!(prefix.network, Network::Mainnet);
        assert_eq!(prefix.amount, Amount::Unspecified);
    }

    #[test]
    fn lnbc2500u_decodes_to_pico() {
        let prefix = Prefix::parse("lnbc2500u").unwrap();
        assert_eq!(prefix.amount, Amount::Pico(2_500_000_000));
    }

    #[test]
    fn shortest_multiplier_round_trips() {
        let prefix = Prefix {
            network: Network::Mainnet,
            amount: Amount::Pico(2_500_000_000),
        };
        assert_eq!(prefix.render(), "lnbc2500u");
    }

    #[test]
    fn unknown_network_is_fatal() {
        assert!(Prefix::parse("lnxx100m").is_err());
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert!(Prefix::parse("lnbc0m").is_err());
    }

    #[test]
    fn digits_required_before_multiplier() {
        assert!(Prefix::parse("lnbcm").is_err());
    }

    #[test]
    fn regtest_tag_is_multi_letter() {
        let prefix = Prefix::parse("lnbcrt100n").unwrap();
        assert_eq!(prefix.network, Network::Regtest);
        assert_eq!(prefix.amount, Amount::Pico(100_000));
    }
}
