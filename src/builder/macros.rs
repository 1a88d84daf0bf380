//! Macros for ergonomic state machine construction.

/// Generate a state enum together with its `State` implementation.
///
/// Each variant is given the name it is keyed and serialized under, so the
/// persisted `value` of a snapshot reads the same as the name used in logs.
///
/// # Example
///
/// ```
/// use statecraft::state_enum;
/// use statecraft::core::State;
///
/// state_enum! {
///     pub enum OrderState {
///         Placed => "placed",
///         Shipping => "shipping",
///         Delivered => "delivered",
///         Lost => "lost",
///     }
///     final: [Delivered]
///     error: [Lost]
/// }
///
/// assert_eq!(OrderState::Shipping.name(), "shipping");
/// assert_eq!(serde_json::to_string(&OrderState::Lost).unwrap(), "\"lost\"");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $label:literal
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $label)]
                $variant
            ),*
        }

        impl $name {
            /// Every state of this enum, in declaration order.
            #[allow(dead_code)]
            pub fn all() -> Vec<Self> {
                vec![$(Self::$variant),*]
            }
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $label),*
                }
            }

            #[allow(unreachable_patterns)]
            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            #[allow(unreachable_patterns)]
            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}
