use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one and inject
/// dependencies, all sharing one fresh in-memory store.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// [`crate::store::MemoryStore`], and [`crate::realtime::Broadcaster`].
#[proc_macro_attribute]
pub fn store_test(_args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the arguments and reject invalid function signatures.
    let (test_args, has_client) = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Only launch a client for tests that ask for one.
    let maybe_client = has_client.then(|| {
        quote! {
            let rocket_client = rocket::local::asynchronous::Client::tracked(
                crate::rocket_for_store(store.clone(), events.clone(), config),
            )
            .await
            .unwrap();
        }
    });

    // Rewrite the test function.
    quote! {
        #[test]
        #[allow(unused_variables)]
        fn #name() {
            /// The test itself.
            #item_fn

            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let config = crate::Config::example();
                let store = crate::store::MemoryStore::new();
                let events = crate::realtime::Broadcaster::new(config.event_buffer());
                #maybe_client

                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<(Vec<TokenStream2>, bool), syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut args = vec![];
    let mut seen = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.get_ident() {
                    let arg = if type_ident == "Client" {
                        Some(quote! { rocket_client })
                    } else if type_ident == "MemoryStore" {
                        Some(quote! { store.clone() })
                    } else if type_ident == "Broadcaster" {
                        Some(quote! { events.clone() })
                    } else {
                        None
                    };
                    if let Some(arg) = arg {
                        if seen.contains(type_ident) {
                            return Err(syn::Error::new(
                                input.span(),
                                format!("Test cannot accept more than one `{type_ident}`"),
                            ));
                        }
                        seen.push(type_ident.clone());
                        args.push(arg);
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `store_ident: MemoryStore` or `events_ident: Broadcaster`",
        ));
    }

    let has_client = seen.iter().any(|ident| ident == "Client");
    Ok((args, has_client))
}
