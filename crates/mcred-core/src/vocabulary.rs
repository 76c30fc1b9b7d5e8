//! # Closed Vocabularies
//!
//! Every enumerated value set in the registry is declared through the
//! [`vocabulary!`](crate::vocabulary) macro, which produces a `Copy` enum that
//! serializes as its wire literal, exposes `ALL` and `as_str()`, and parses
//! case-insensitively via `FromStr` (query strings arrive in any case, JSON
//! bodies must match exactly).

/// Declare a closed vocabulary enum.
///
/// ```ignore
/// mcred_core::vocabulary! {
///     /// Delivery format.
///     pub enum DeliveryMode {
///         Online => "ONLINE",
///         InPerson => "IN_PERSON",
///     }
/// }
/// ```
#[macro_export]
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize, utoipa::ToSchema,
        )]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire literal.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $wire, )+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let upper = s.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $( $wire => Ok(Self::$variant), )+
                    _ => Err($crate::error::UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Kind of credential a program awards.
    pub enum CredentialType {
        Certificate => "CERTIFICATE",
        DigitalBadge => "DIGITAL_BADGE",
        MicroMasters => "MICRO_MASTERS",
        MicroBachelors => "MICRO_BACHELORS",
        ProfessionalCertificate => "PROFESSIONAL_CERTIFICATE",
        ShortCourse => "SHORT_COURSE",
    }
}

vocabulary! {
    /// How a program is delivered to learners.
    pub enum DeliveryMode {
        Online => "ONLINE",
        InPerson => "IN_PERSON",
        Hybrid => "HYBRID",
        SelfPaced => "SELF_PACED",
    }
}

vocabulary! {
    /// Academic level of a micro-credential.
    pub enum CredentialLevel {
        Introductory => "INTRODUCTORY",
        Intermediate => "INTERMEDIATE",
        Advanced => "ADVANCED",
        Professional => "PROFESSIONAL",
        Postgraduate => "POSTGRADUATE",
    }
}

vocabulary! {
    /// Unit in which credit values are expressed.
    pub enum CreditType {
        Ects => "ECTS",
        UsCreditHour => "US_CREDIT_HOUR",
        CpdHour => "CPD_HOUR",
        Ceu => "CEU",
        Nqf => "NQF",
    }
}

vocabulary! {
    /// What a recognizing institution grants for a credential.
    pub enum RecognitionType {
        FullCredit => "FULL_CREDIT",
        PartialCredit => "PARTIAL_CREDIT",
        ElectiveCredit => "ELECTIVE_CREDIT",
        AdvancedStanding => "ADVANCED_STANDING",
        Exemption => "EXEMPTION",
    }
}

vocabulary! {
    /// How recognized credit appears on the learner's transcript.
    pub enum TranscriptMethod {
        LetterGrade => "LETTER_GRADE",
        PassFail => "PASS_FAIL",
        CreditOnly => "CREDIT_ONLY",
        Notation => "NOTATION",
    }
}

vocabulary! {
    /// Shape of a transfer pathway between two institutions.
    pub enum PathwayType {
        Transfer => "TRANSFER",
        Articulation => "ARTICULATION",
        Stackable => "STACKABLE",
        Progression => "PROGRESSION",
    }
}

vocabulary! {
    pub enum InstitutionType {
        University => "UNIVERSITY",
        College => "COLLEGE",
        Polytechnic => "POLYTECHNIC",
        PrivateProvider => "PRIVATE_PROVIDER",
        Industry => "INDUSTRY",
        Government => "GOVERNMENT",
    }
}
