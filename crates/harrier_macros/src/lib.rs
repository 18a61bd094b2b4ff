use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, GenericArgument, ItemFn, LitInt, Pat, PathArguments, Type};

/// Time a steering system when the `perf_stats` feature is enabled.
///
/// The function body is wrapped in a drop guard that reports the elapsed
/// time through `bevy::prelude::info!` once the body returns. Without the
/// feature the guard is compiled out entirely.
///
/// If the function takes `tick: Res<SteerTick>`, the guard also reports on
/// every 100th tick regardless of duration, which gives a steady heartbeat
/// in the log for cheap systems.
///
/// # Example
/// ```ignore
/// #[profile(2)] // report when slower than 2ms
/// pub fn evaluate_plans(query: Query<&Kinematics>, tick: Res<SteerTick>) {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        let lit = parse_macro_input!(attr as LitInt);
        lit.base10_parse().unwrap_or(1)
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let name = sig.ident.to_string();

    let tick_arg = sig.inputs.iter().any(is_steer_tick_arg);

    let tick_field = if tick_arg {
        quote! { Some(tick.0) }
    } else {
        quote! { None }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_guard = {
                struct ProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                    tick: Option<u64>,
                }
                impl Drop for ProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        let heartbeat = self.tick.map_or(false, |t| t % 100 == 0);
                        if elapsed.as_millis() > #threshold_ms || heartbeat {
                            bevy::prelude::info!("[PERF] {}: {:?}", self.name, elapsed);
                        }
                    }
                }
                ProfileGuard {
                    name: #name,
                    start: std::time::Instant::now(),
                    tick: #tick_field,
                }
            };

            #block
        }
    };

    output.into()
}

/// Matches an argument shaped like `tick: Res<SteerTick>`.
fn is_steer_tick_arg(arg: &FnArg) -> bool {
    let FnArg::Typed(pat_type) = arg else {
        return false;
    };
    let Pat::Ident(ident) = &*pat_type.pat else {
        return false;
    };
    if ident.ident != "tick" {
        return false;
    }
    let Type::Path(outer) = &*pat_type.ty else {
        return false;
    };
    let Some(res) = outer.path.segments.last() else {
        return false;
    };
    if res.ident != "Res" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &res.arguments else {
        return false;
    };
    args.args.iter().any(|a| match a {
        GenericArgument::Type(Type::Path(inner)) => inner
            .path
            .segments
            .last()
            .is_some_and(|s| s.ident == "SteerTick"),
        _ => false,
    })
}
