use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, ItemFn, Pat, PathArguments, Type};

/// The dependencies a test function may ask for, identified by the final
/// path segment of the parameter type.
enum TestArg {
    /// `rocket::local::asynchronous::Client`
    Client,
    /// `mongodb::Database`
    Database,
    /// `crate::model::mongodb::Coll<T>` for any collection type `T`.
    Coll,
}

#[proc_macro_attribute]
/// Turn an asynchronous function into a database-backed integration test.
///
/// The function may take any combination of a
/// [`rocket::local::asynchronous::Client`], a [`mongodb::Database`] and any
/// number of `Coll<T>` handles; they are injected in declaration order. Each
/// test gets a freshly-named database, which is dropped again WHETHER OR NOT
/// the test completes by passing, failing or otherwise panicking.
///
/// If a panic occurs via a failed assertion or other unwinding panic, the
/// database is dropped and the panic is "rethrown".
///
/// Note: this attribute requires `crate::client_and_db` to exist, and the
/// `futures` crate to be a test dependency so the body can run inside
/// `catch_unwind` via `futures::executor::block_on`.
pub fn db_test(_: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    let args = match test_args(&item_fn) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let inner_name = format_ident!("{}_inner", name);
    item_fn.sig.ident = inner_name.clone();

    // Build the argument list for the renamed future.
    let wants_client = args.iter().any(|arg| matches!(arg, TestArg::Client));
    let call_args = args
        .iter()
        .map(|arg| -> TokenStream2 {
            match arg {
                TestArg::Client => quote! { client },
                TestArg::Database => quote! { db.clone() },
                TestArg::Coll => quote! { crate::model::mongodb::Coll::from_db(&db) },
            }
        })
        .collect::<Vec<_>>();

    // If the test never asks for the client we still construct it (it drives
    // the fairings that create the database), but under a quiet name.
    let client_ident = if wants_client {
        format_ident!("client")
    } else {
        format_ident!("_client")
    };

    quote! {
        #[rocket::async_test]
        async fn #name() {
            let (#client_ident, db) = crate::client_and_db().await;

            #item_fn

            // To avoid futures not being transferable across Unwind boundaries:
            // - See https://stackoverflow.com/a/66529014/13112498
            let client_cell = std::sync::Mutex::new(#client_ident);
            let db_cell = std::sync::Mutex::new(db.clone());

            let result = std::panic::catch_unwind(|| {
                let #client_ident = client_cell.into_inner().unwrap();
                let db = db_cell.into_inner().unwrap();

                let handle = rocket::tokio::runtime::Handle::current();
                let _guard = handle.enter();

                futures::executor::block_on(#inner_name(#(#call_args),*));
            });

            db.drop(None).await.unwrap();

            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

/// Classify every parameter of the tagged function, rejecting anything we
/// don't know how to inject.
fn test_args(item_fn: &ItemFn) -> Result<Vec<TestArg>, syn::Error> {
    let mut args = Vec::new();

    for input in &item_fn.sig.inputs {
        let pat_type = match input {
            FnArg::Typed(pat_type) => pat_type,
            FnArg::Receiver(_) => {
                return Err(syn::Error::new(
                    input.span(),
                    "Test functions cannot take `self`",
                ));
            }
        };

        if !matches!(&*pat_type.pat, Pat::Ident(_)) {
            return Err(syn::Error::new(
                pat_type.pat.span(),
                "Test function parameters must be plain identifiers",
            ));
        }

        let type_path = match &*pat_type.ty {
            Type::Path(type_path) => type_path,
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "Expected `Client`, `Database`, or `Coll<T>`",
                ));
            }
        };

        // Only the last path segment matters; tests may use full paths.
        let segment = type_path
            .path
            .segments
            .last()
            .ok_or_else(|| syn::Error::new(type_path.span(), "Empty type path"))?;

        let arg = match (segment.ident.to_string().as_str(), &segment.arguments) {
            ("Client", PathArguments::None) => TestArg::Client,
            ("Database", PathArguments::None) => TestArg::Database,
            ("Coll", PathArguments::AngleBracketed(_)) => TestArg::Coll,
            _ => {
                return Err(syn::Error::new(
                    segment.span(),
                    "Expected `Client`, `Database`, or `Coll<T>`",
                ));
            }
        };
        args.push(arg);
    }

    Ok(args)
}
