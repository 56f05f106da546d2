use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use fake::{
    faker::{
        internet::en::FreeEmailProvider,
        name::en::{FirstName, LastName},
    },
    Fake,
};
use rand::Rng;

use crate::record::UserRecord;

pub struct UserSynthesizer<R> {
    rng: R,
}

impl<R: Rng> UserSynthesizer<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn user(&mut self) -> UserRecord {
        let first_name: String = FirstName().fake_with_rng(&mut self.rng);
        let last_name: String = LastName().fake_with_rng(&mut self.rng);
        let email = email_for(&first_name, &last_name, &mut self.rng);
        let ip_address = random_ip(&mut self.rng);

        UserRecord {
            name: format!("{first_name} {last_name}"),
            first_name,
            last_name,
            email,
            ip_address,
        }
    }

    pub fn batch(&mut self, count: usize) -> Vec<UserRecord> {
        (0..count).map(|_| self.user()).collect()
    }
}

/// Email address built from the given names. Only the local-part pattern and
/// the provider are random; the local part always starts with the first name.
pub fn email_for<R: Rng + ?Sized>(first_name: &str, last_name: &str, rng: &mut R) -> String {
    let first = sanitize_local_part(first_name).unwrap_or_else(|| "user".into());
    let last = sanitize_local_part(last_name);

    let local_part = match (rng.random_range(0..3), last) {
        (0, Some(last)) => format!("{first}.{last}"),
        (1, Some(last)) => format!("{first}_{last}"),
        _ => format!("{first}{}", rng.random_range(1..=99)),
    };
    let provider: String = FreeEmailProvider().fake_with_rng(rng);

    format!("{local_part}@{provider}")
}

/// IPv4 or IPv6 with equal chance, in textual form.
pub fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    let ip = if rng.random_bool(0.5) {
        IpAddr::V4(Ipv4Addr::from(rng.random::<u32>()))
    } else {
        IpAddr::V6(Ipv6Addr::from(rng.random::<u128>()))
    };
    ip.to_string()
}

fn sanitize_local_part(name: &str) -> Option<String> {
    let out: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn test_batch_has_requested_size() {
        let mut synth = UserSynthesizer::new(StdRng::seed_from_u64(1));

        assert_eq!(0, synth.batch(0).len());
        assert_eq!(1, synth.batch(1).len());
        assert_eq!(250, synth.batch(250).len());
    }

    #[test]
    fn test_user_fields_are_derived_from_names() {
        let mut synth = UserSynthesizer::new(StdRng::seed_from_u64(42));

        for user in synth.batch(200) {
            assert_eq!(format!("{} {}", user.first_name, user.last_name), user.name);

            let first = sanitize_local_part(&user.first_name).unwrap_or_else(|| "user".into());
            let (local_part, domain) = user.email.split_once('@').unwrap();
            assert!(local_part.starts_with(&first), "{}", user.email);
            assert!(domain.contains('.'), "{}", user.email);

            assert!(user.ip_address.parse::<IpAddr>().is_ok());
            assert!(user.ip_address.len() <= 45);
            assert!(user.first_name.len() <= 100);
            assert!(user.last_name.len() <= 100);
            assert!(user.name.len() <= 200);
            assert!(user.email.len() <= 200);
        }
    }

    #[test]
    fn test_same_seed_same_users() {
        let lhs = UserSynthesizer::new(StdRng::seed_from_u64(7)).batch(20);
        let rhs = UserSynthesizer::new(StdRng::seed_from_u64(7)).batch(20);

        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_email_for_is_consistent_with_names() {
        for seed in 0..50 {
            let email = email_for("Mary-Jane", "O'Connor", &mut StdRng::seed_from_u64(seed));
            let again = email_for("Mary-Jane", "O'Connor", &mut StdRng::seed_from_u64(seed));
            assert_eq!(email, again);

            let (local_part, _) = email.split_once('@').unwrap();
            assert!(
                local_part == "maryjane.oconnor"
                    || local_part == "maryjane_oconnor"
                    || local_part
                        .strip_prefix("maryjane")
                        .is_some_and(|rest| rest.parse::<u8>().is_ok()),
                "{email}"
            );
        }
    }

    #[test]
    fn test_email_for_without_usable_names() {
        let email = email_for("", "---", &mut StdRng::seed_from_u64(3));
        assert!(email.starts_with("user"), "{email}");
    }

    #[test]
    fn test_random_ip_mixes_versions() {
        let mut rng = StdRng::seed_from_u64(11);
        let ips: Vec<IpAddr> = (0..200)
            .map(|_| random_ip(&mut rng).parse().unwrap())
            .collect();

        assert!(ips.iter().any(IpAddr::is_ipv4));
        assert!(ips.iter().any(IpAddr::is_ipv6));
    }
}
