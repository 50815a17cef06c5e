// Suggested values offered by pickers. The store accepts free text, so these
// lists guide input without restricting it.

use crate::entry::Kind;

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Groceries",
    "Fixed Expenses",
    "Rent Payments",
    "Utilities (Electricity, Water, Gas, Internet, Phone)",
    "Insurance Premiums (Health, Auto, Life, Home)",
    "Subscription Services (Streaming platforms, Gym memberships, Magazines)",
    "Variable Expenses",
    "Transportation (Fuel, Public Transport, Ride-sharing)",
    "Dining Out",
    "Entertainment (Movies, Concerts, Hobbies)",
    "Clothing and Accessories",
    "Healthcare (Doctor visits, Medicines, Therapies)",
    "Education (Books, Tuition Fees, Courses)",
    "Gifts and Celebrations (Birthdays, Weddings)",
    "Irregular/One-time Expenses",
    "Vacations/Travel",
    "Home Repairs and Maintenance",
    "Large Purchases (Appliances, Furniture, Electronics)",
    "Emergencies (Medical, Vehicle Repairs)",
];

pub const BUDGET_CATEGORIES: &[&str] = &[
    "Fixed Expenses",
    "Rent/Mortgage Payments",
    "Utilities",
    "Groceries",
    "Transportation",
    "Entertainment",
    "Healthcare",
    "Education",
    "Savings",
];

pub const INCOME_TYPES: &[&str] = &["Salary", "Business", "Investments", "Freelancing", "Other"];

/// Picker values for the category (or income type) field of a kind.
pub fn suggested_categories(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Income => INCOME_TYPES,
        Kind::Expense => EXPENSE_CATEGORIES,
        Kind::Budget => BUDGET_CATEGORIES,
    }
}

/// Case-insensitive membership in the suggested list.
pub fn is_suggested(kind: Kind, category: &str) -> bool {
    let category = category.trim();
    suggested_categories(kind)
        .iter()
        .any(|known| known.eq_ignore_ascii_case(category))
}
