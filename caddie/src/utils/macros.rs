// FICHIER : caddie/src/utils/macros.rs

/// Lève une erreur structurée, la logue et retourne immédiatement `Err(..)`.
///
/// Le composant est déduit du code (`ERR_CART_...` -> `CART`).
#[macro_export]
macro_rules! caddie_error {
    ($code:expr, error = $err:expr, context = $ctx:expr) => {{
        let data = $crate::utils::error::StructuredError::new($code, $err.to_string(), $ctx);
        tracing::error!(
            service = %data.service,
            componentName = %data.component,
            code = %data.code,
            context = %data.context,
            "{}",
            data.message
        );
        return Err($crate::utils::error::AppError::Structured(Box::new(data)).into());
    }};
    ($code:expr, error = $err:expr) => {
        $crate::caddie_error!($code, error = $err, context = $crate::utils::json::Value::Null)
    };
    ($code:expr, context = $ctx:expr) => {
        $crate::caddie_error!($code, error = $crate::utils::i18n::t($code), context = $ctx)
    };
}

/// Affiche une info à l'utilisateur (traduite) et logue l'événement
#[macro_export]
macro_rules! user_info {
    ($key:expr) => {{
        let msg = $crate::utils::i18n::t($key);
        println!("{}", msg);
        tracing::info!(event = "user_notification", key = $key, message = %msg);
    }};
    ($key:expr, $($arg:tt)*) => {{
        let args_formatted = format!($($arg)*);
        let full_msg = format!("{} {}", $crate::utils::i18n::t($key), args_formatted);
        println!("{}", full_msg);
        tracing::info!(event = "user_notification", key = $key, message = %full_msg);
    }};
}

/// Affiche un succès (vert) à l'utilisateur
#[macro_export]
macro_rules! user_success {
    ($key:expr) => {{
        let msg = $crate::utils::i18n::t($key);
        println!("✅ {}", msg);
        tracing::info!(event = "user_success", key = $key, message = %msg);
    }};
    ($key:expr, $($arg:tt)*) => {{
        let args_formatted = format!($($arg)*);
        let full_msg = format!("{} {}", $crate::utils::i18n::t($key), args_formatted);
        println!("✅ {}", full_msg);
        tracing::info!(event = "user_success", key = $key, message = %full_msg);
    }};
}

/// Affiche une erreur à l'utilisateur ET logue la structure technique enrichie
#[macro_export]
macro_rules! user_error {
    ($key:expr) => {{
        let msg = $crate::utils::i18n::t($key);
        eprintln!("❌ {}", msg);
        tracing::error!(event = "user_error", key = $key, message = %msg);
    }};

    // Format enrichi (composant + action), sans identifiant de corrélation
    (
        $key:expr,
        error = $err:expr,
        component = $comp:expr,
        action = $action:expr
    ) => {{
        let msg = $crate::utils::i18n::t($key);
        eprintln!("❌ [{}] {} : {}", $comp, msg, $err);
        tracing::error!(
            service = "caddie-app", componentName = $comp, action = $action,
            reason = %msg, error = ?$err,
            event = "user_error", key = $key
        );
    }};

    // Clé + Arguments de formatage
    // (Doit toujours être placé à la fin pour ne pas intercepter la syntaxe du dessus)
    ($key:expr, $($arg:tt)*) => {{
        let args_formatted = format!($($arg)*);
        let full_msg = format!("{} {}", $crate::utils::i18n::t($key), args_formatted);
        eprintln!("❌ {}", full_msg);
        tracing::error!(event = "user_error", key = $key, message = %full_msg);
    }};
}
