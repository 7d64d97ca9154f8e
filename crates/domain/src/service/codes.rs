//! Wire codes for the category-specific enumerations.
//!
//! Every code enum keeps unrecognised values in an `Unknown` variant instead
//! of rejecting them, so a booking carrying a code this build does not know
//! still decodes and simply prices at zero.

use serde::{Deserialize, Serialize};

macro_rules! wire_code {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A code not known to this build.
            Unknown(String),
        }

        impl $name {
            /// Returns the wire code.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unknown(code) => code,
                }
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                match Self::from(code.as_str()) {
                    Self::Unknown(_) => Self::Unknown(code),
                    known => known,
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Unknown(code) => code,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_code!(
    /// Kind of dwelling for general cleaning.
    HomeType {
        CondoRoom => "CONDO_ROOM",
        House => "HOUSE",
    }
);

wire_code!(
    /// Vehicle class for car cleaning.
    VehicleClass {
        Sedan => "SEDAN",
        Mpv => "MPV",
        Suv => "SUV",
        Van => "VAN",
        Pickup => "PICKUP",
        SmallCar => "SMALL_CAR",
    }
);

wire_code!(
    /// Seating type for couch cleaning.
    SeatType {
        Stool => "STOOL",
        Ottoman => "OTTOMAN",
        DiningChair => "DINING_CHAIR",
        OfficeChair => "OFFICE_CHAIR",
        Armchair => "ARMCHAIR",
        Recliner => "RECLINER",
        Loveseat => "LOVESEAT",
        ThreeSeater => "THREE_SEATER",
        FourSeater => "FOUR_SEATER",
        SofaBed => "SOFA_BED",
        LShaped => "L_SHAPED",
        UShaped => "U_SHAPED",
    }
);

wire_code!(
    /// Bed size for mattress cleaning.
    BedType {
        Single => "SINGLE",
        SuperSingle => "SUPER_SINGLE",
        Double => "DOUBLE",
        Queen => "QUEEN",
        King => "KING",
        CaliforniaKing => "CALIFORNIA_KING",
    }
);
