const CREATE_TRIP_TABLE: &str = "CREATE TABLE IF NOT EXISTS trip (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  base_currency TEXT NOT NULL,
  target_currency TEXT NOT NULL,
  exchange_rate REAL,
  card_exchange_rate REAL,
  cash_exchange_rate REAL,
  created_at DATETIME NOT NULL
)";

const CREATE_TRAVELER_TABLE: &str = "CREATE TABLE IF NOT EXISTS traveler (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  trip_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  deleted_at DATETIME
)";

const CREATE_BILL_TABLE: &str = "CREATE TABLE IF NOT EXISTS bill (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  trip_id INTEGER NOT NULL,
  description TEXT NOT NULL,
  category TEXT NOT NULL,
  total_amount REAL NOT NULL,
  additional_charges REAL,
  payer_id TEXT NOT NULL,
  payment_method TEXT,
  custom_exchange_rate REAL,
  created_at DATETIME NOT NULL,
  deleted_at DATETIME
)";

const CREATE_BILL_SPLIT_TABLE: &str = "CREATE TABLE IF NOT EXISTS bill_split (
  bill_id INTEGER NOT NULL,
  traveler_id TEXT NOT NULL,
  amount REAL NOT NULL,
  amount_myr REAL NOT NULL
)";

const CREATE_RECEIPT_PHOTO_TABLE: &str = "CREATE TABLE IF NOT EXISTS receipt_photo (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  bill_id INTEGER NOT NULL,
  uri TEXT NOT NULL,
  name TEXT NOT NULL,
  size INTEGER NOT NULL,
  mime_type TEXT NOT NULL,
  uploaded_at DATETIME NOT NULL
)";

pub fn create_all_tables(connection: &rusqlite::Connection) -> anyhow::Result<()> {
    connection.execute(CREATE_TRIP_TABLE, ())?;
    connection.execute(CREATE_TRAVELER_TABLE, ())?;
    connection.execute(CREATE_BILL_TABLE, ())?;
    connection.execute(CREATE_BILL_SPLIT_TABLE, ())?;
    connection.execute(CREATE_RECEIPT_PHOTO_TABLE, ())?;
    Ok(())
}
