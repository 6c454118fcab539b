use clap::{Args, Subcommand};
use caddie::cart_engine::model::{parse_quantity_input, Cart, ProductRef};
use caddie::cart_engine::CartSession;
use caddie::utils::error::AnyResult;
use caddie::{user_info, user_success};

/// Articles du panier actif et cycle de vie des paniers
#[derive(Args, Clone, Debug)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: CartCommands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CartCommands {
    /// Affiche le panier actif
    Show,
    /// Liste les paniers de la session
    List,
    /// Ajoute un produit (ou augmente sa quantité)
    Add {
        product_id: String,
        /// Quantité saisie (entier positif)
        #[arg(default_value = "1")]
        quantity: String,
        /// Libellé affiché si le catalogue ne le fournit pas
        #[arg(long)]
        name: Option<String>,
    },
    /// Fixe la quantité d'une ligne (0 ou moins la supprime)
    Qty {
        item_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Retire une ligne
    Remove { item_id: String },
    /// Crée un panier qui devient actif
    Create { name: String },
    /// Renomme un panier
    Rename { cart_id: String, name: String },
    /// Supprime un panier
    Delete { cart_id: String },
    /// Change de panier actif
    Switch { cart_id: String },
}

pub async fn handle(args: CartArgs, session: &CartSession) -> AnyResult<()> {
    match args.command {
        CartCommands::Show => match session.cart() {
            Some(cart) => print_cart(&cart),
            None => user_info!("CART_NO_ACTIVE"),
        },

        CartCommands::List => {
            let carts = session.list_carts().await?;
            user_info!("CART_LIST", "({})", carts.len());
            for summary in carts {
                let marker = if summary.is_active { "*" } else { " " };
                println!(
                    " {} {:<12} {:<24} {} article(s)",
                    marker, summary.id, summary.name, summary.item_count
                );
            }
        }

        CartCommands::Add {
            product_id,
            quantity,
            name,
        } => {
            // Validation locale avant toute mutation
            let quantity = parse_quantity_input(&quantity)?;
            let label = name.unwrap_or_else(|| product_id.clone());
            session
                .add_item(ProductRef::new(product_id.clone(), label), i64::from(quantity))
                .await?;
            user_success!("CART_ITEM_ADDED", "{} x{}", product_id, quantity);
        }

        CartCommands::Qty { item_id, quantity } => {
            session.update_item_quantity(&item_id, quantity)?;
            if quantity <= 0 {
                user_success!("CART_ITEM_REMOVED", "{}", item_id);
            } else {
                user_success!("CART_ITEM_UPDATED", "{} x{}", item_id, quantity);
            }
        }

        CartCommands::Remove { item_id } => {
            session.remove_item(&item_id)?;
            user_success!("CART_ITEM_REMOVED", "{}", item_id);
        }

        CartCommands::Create { name } => {
            let cart = session.create_cart(&name).await?;
            user_success!("CART_CREATED", "{} ({})", cart.name, cart.id);
        }

        CartCommands::Rename { cart_id, name } => {
            let cart = session.rename_cart(&cart_id, &name).await?;
            user_success!("CART_RENAMED", "{} ({})", cart.name, cart.id);
        }

        CartCommands::Delete { cart_id } => {
            session.delete_cart(&cart_id).await?;
        }

        CartCommands::Switch { cart_id } => {
            let cart = session.switch_cart(&cart_id).await?;
            user_success!("CART_SWITCHED", "{} ({})", cart.name, cart.id);
            print_cart(&cart);
        }
    }
    Ok(())
}

fn print_cart(cart: &Cart) {
    user_info!("CART_SHOW", "{} ({})", cart.name, cart.id);
    if cart.is_empty() {
        user_info!("CART_EMPTY");
        return;
    }
    for item in &cart.items {
        let price = item
            .product
            .lowest_price()
            .map(|p| format!("{:.2} $ @ {}", p.price, p.store_id))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<18} {:<28} x{:<3} {}",
            item.id, item.product.name, item.quantity, price
        );
        for sub in &item.substitutions {
            let mark = if sub.is_approved { "✔" } else { "·" };
            println!(
                "      {} {:<14} {:<24} x{}",
                mark, sub.id, sub.product.name, sub.quantity
            );
        }
    }
}
