use std::time::Duration;

pub const FOODS_PATH: &str = "/api/foods";
pub const DIET_PATH: &str = "/api/diet";
pub const DIET_RENAME_PATH: &str = "/api/diet/name_only";
pub const DIETS_PATH: &str = "/api/diets";
pub const RDA_PATH: &str = "/api/rda";
pub const UL_PATH: &str = "/api/ul";
pub const USER_PATH: &str = "/api/users/me";
pub const RESET_SETTINGS_PATH: &str = "/api/users/me/reset_settings";
pub const FDC_IMPORT_PATH: &str = "/api/foods/create_update_food_from_fdcid";

pub const AUTH_COOKIE: &str = "auth_token";

pub const EDIT_SAVE_DELAY: Duration = Duration::from_millis(900);
pub const SHORT_SAVE_DELAY: Duration = Duration::from_millis(200);

// food used for freshly added rows, the user picks the real one afterwards
pub const NEW_ITEM_FDC_ID: i64 = 170567;
pub const NEW_ITEM_QUANTITY: f64 = 100.0;

pub const FOOD_SEARCH_LIMIT: usize = 20;
pub const FOOD_SEARCH_THRESHOLD: f64 = 0.4;

pub const DIET_COLOR_SWATCHES: [&str; 6] = [
    "#971d1f", "#ad5322", "#af882e", "#538d28", "#2b8066", "#375875",
];
pub const ROW_COLOR_ALPHA: f64 = 0.5;

pub const COL_DELETE_ACTION: &str = "delete_action";
pub const COL_COLOR: &str = "color";
pub const COL_NAME: &str = "Name";
pub const COL_QUANTITY: &str = "quantity";
pub const COL_DIET_NAME: &str = "diet_name";
pub const COL_FDC_ID: &str = "fdc_id";
pub const COL_SORT_ORDER: &str = "sort_order";
pub const COL_ENERGY_KCAL: &str = "Energy kcal";
pub const COL_ENERGY_KJ: &str = "Energy kJ";
pub const COL_UNIT: &str = "Unit";

pub const LEADING_COLUMNS: [&str; 4] = [COL_DELETE_ACTION, COL_COLOR, COL_NAME, COL_QUANTITY];
pub const INTERNAL_COLUMNS: [&str; 4] = [COL_DIET_NAME, COL_FDC_ID, COL_SORT_ORDER, COL_ENERGY_KJ];
// carried in every row so a save payload can be rebuilt
pub const PAYLOAD_COLUMNS: [&str; 3] = [COL_DIET_NAME, COL_FDC_ID, COL_SORT_ORDER];
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_NAME,
    COL_QUANTITY,
    COL_COLOR,
    COL_DIET_NAME,
    COL_FDC_ID,
    COL_SORT_ORDER,
];

pub const DEFAULT_DIET_COLUMNS: [&str; 37] = [
    "Name",
    "Unit",
    "Price",
    "Energy kcal",
    "Protein g",
    "Total lipid (fat) g",
    "Carbohydrate, by difference g",
    "Fiber, total dietary g",
    "Calcium, Ca mg",
    "Iron, Fe mg",
    "Magnesium, Mg mg",
    "Phosphorus, P mg",
    "Potassium, K mg",
    "Sodium, Na mg",
    "Zinc, Zn mg",
    "Copper, Cu mg",
    "Selenium, Se µg",
    "Vitamin C, total ascorbic acid mg",
    "Thiamin mg",
    "Riboflavin mg",
    "Niacin mg",
    "Pantothenic acid mg",
    "Vitamin B-6 mg",
    "Folate, total µg",
    "Vitamin B-12 µg",
    "Choline, total mg",
    "Vitamin A, RAE µg",
    "Cholesterol mg",
    "Fatty acids, total saturated g",
    "Vitamin E (alpha-tocopherol) mg",
    "Vitamin K, total µg",
    "Vitamin D (D2 + D3), International Units IU",
    "diet_name",
    "fdc_id",
    "quantity",
    "sort_order",
    "color",
];

pub const DEFAULT_THRESHOLD: f64 = 100.0;
pub const DEFAULT_DOMINANT_PROTEIN: &str = "#490303";
pub const DEFAULT_DOMINANT_CARB: &str = "#4c65b8";
pub const DEFAULT_DOMINANT_FAT: &str = "#98823e";

pub const PROTEIN_COLUMN: &str = "Protein g";
pub const CARB_COLUMN: &str = "Carbohydrate, by difference g";
pub const FAT_COLUMN: &str = "Total lipid (fat) g";

pub const LOCAL_DB: &str = "diet-table.sqlite";
pub const THEME_KEY: &str = "theme";
