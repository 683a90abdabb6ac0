//! Sample Request Generator
//!
//! Prints random menu item requests as JSON lines, ready to pipe into the
//! predictor: `sample-requests 50 0.2 | menu-profitability`.

use menu_profitability::InferenceRequest;
use rand::Rng;
use std::io::Write;
use tracing::info;

const CATEGORIES: [&str; 5] = ["Desserts", "Main Course", "Appetizers", "Beverages", "Salads"];

/// Known menu items per category, with typical ingredients and price range
const MENU: [(&str, &str, &str, f64, f64); 12] = [
    ("Desserts", "Newyork Cheesecake", "Chocolate Butter Sugar Eggs", 12.0, 20.0),
    ("Desserts", "Tiramisu", "Coffee Sugar Eggs Cheese", 8.0, 16.0),
    ("Desserts", "Chocolate Lava Cake", "Chocolate Butter Sugar Eggs", 9.0, 18.0),
    ("Main Course", "Chicken Biryani", "Chicken Rice Garlic Spices", 12.0, 24.0),
    ("Main Course", "Grilled Salmon", "Salmon Lemon Butter Garlic", 18.0, 32.0),
    ("Main Course", "Margherita Pizza", "Tomato Cheese Basil", 10.0, 18.0),
    ("Appetizers", "Garlic Bread", "Bread Garlic Butter", 4.0, 9.0),
    ("Appetizers", "Spring Rolls", "Cabbage Carrot Wrapper", 5.0, 10.0),
    ("Beverages", "Iced Latte", "Coffee Milk Sugar Ice", 3.0, 7.0),
    ("Beverages", "Lemonade", "Lemon Sugar Water", 2.5, 6.0),
    ("Salads", "Caesar Salad", "Lettuce Cheese Croutons Dressing", 7.0, 14.0),
    ("Salads", "Greek Salad", "Lettuce Tomato Feta Olives", 7.0, 13.0),
];

/// Request generator for exercising the predictor
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    unseen_counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            unseen_counter: 0,
        }
    }

    fn restaurant_id(&mut self) -> String {
        format!("R{:03}", self.rng.gen_range(1..=6))
    }

    /// A request for an item present in the training menu
    fn generate_known(&mut self) -> InferenceRequest {
        let (category, item, ingredients, low, high) = MENU[self.rng.gen_range(0..MENU.len())];
        let price = (self.rng.gen_range(low..high) * 100.0).round() / 100.0;

        InferenceRequest::new(self.restaurant_id(), category, ingredients, item, price)
    }

    /// A request for an item the frequency table has never seen
    fn generate_unseen(&mut self) -> InferenceRequest {
        self.unseen_counter += 1;
        let category = CATEGORIES[self.rng.gen_range(0..CATEGORIES.len())];
        let price = (self.rng.gen_range(2.0..35.0_f64) * 100.0).round() / 100.0;

        InferenceRequest::new(
            self.restaurant_id(),
            category,
            "Sugar Butter Garlic",
            format!("Chef Special {}", self.unseen_counter),
            price,
        )
    }
}

/// Unseen-item rate from the command line; unparsable or non-finite falls back to 0.1
fn parse_rate(arg: Option<&str>) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|rate| rate.is_finite())
        .unwrap_or(0.1)
        .clamp(0.0, 1.0)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_requests=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(20);
    let unseen_rate = parse_rate(args.get(2).map(String::as_str));

    info!(count, unseen_rate, "Generating sample requests");

    let mut generator = RequestGenerator::new();
    let mut rng = rand::thread_rng();
    let mut stdout = std::io::stdout().lock();

    let mut known_count = 0;
    let mut unseen_count = 0;

    for _ in 0..count {
        let request = if rng.gen_bool(unseen_rate) {
            unseen_count += 1;
            generator.generate_unseen()
        } else {
            known_count += 1;
            generator.generate_known()
        };

        serde_json::to_writer(&mut stdout, &request)?;
        stdout.write_all(b"\n")?;
    }

    info!(
        "Completed! Generated {} requests ({} known items, {} unseen)",
        count, known_count, unseen_count
    );

    Ok(())
}
